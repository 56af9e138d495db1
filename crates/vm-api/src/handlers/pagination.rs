use vm_common::api::Pagination;

use crate::error::ApiError;

const MAX_LIMIT: i64 = 200;
const MAX_OFFSET: i64 = 10_000;

pub fn validate_pagination(limit: i64, offset: i64) -> Result<(i64, i64), ApiError> {
    if !(1..=MAX_LIMIT).contains(&limit) {
        return Err(ApiError::BadRequest(format!(
            "limit must be between 1 and {MAX_LIMIT}"
        )));
    }

    if !(0..=MAX_OFFSET).contains(&offset) {
        return Err(ApiError::BadRequest(format!(
            "offset must be between 0 and {MAX_OFFSET}"
        )));
    }

    Ok((limit, offset))
}

pub fn checked(page: Pagination) -> Result<(i64, i64), ApiError> {
    validate_pagination(page.limit, page.offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bounds() {
        assert_eq!(validate_pagination(1, 0).unwrap(), (1, 0));
        assert_eq!(validate_pagination(200, 10_000).unwrap(), (200, 10_000));
        assert_eq!(checked(Pagination::default()).unwrap(), (50, 0));
    }

    #[test]
    fn rejects_out_of_range() {
        assert!(validate_pagination(0, 0).is_err());
        assert!(validate_pagination(201, 0).is_err());
        assert!(validate_pagination(10, -1).is_err());
        assert!(validate_pagination(10, 10_001).is_err());
    }
}
