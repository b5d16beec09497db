use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Form,
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::utils::error::AppError;

/// A urlencoded form that parsed and passed its `validator` rules. Both
/// failures come back as the JSON error envelope.
pub struct ValidatedForm<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedForm<T>
where
    T: DeserializeOwned + Validate + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Form(value) = Form::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::ValidationError(rejection.body_text()))?;

        value.validate()?;
        Ok(ValidatedForm(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::header};
    use serde::Deserialize;

    #[derive(Debug, Deserialize, Validate)]
    struct Amount {
        #[validate(range(min = 1))]
        amount: i32,
    }

    fn form_request(body: &'static str) -> Request {
        Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_valid_form_is_extracted() {
        let ValidatedForm(form) = ValidatedForm::<Amount>::from_request(form_request("amount=5"), &())
            .await
            .unwrap();
        assert_eq!(form.amount, 5);
    }

    #[tokio::test]
    async fn test_unparsable_and_missing_fields_are_validation_errors() {
        for body in ["amount=lots", ""] {
            let err = ValidatedForm::<Amount>::from_request(form_request(body), &())
                .await
                .err()
                .unwrap();
            assert!(matches!(err, AppError::ValidationError(_)));
        }
    }

    #[tokio::test]
    async fn test_rule_violations_are_validation_errors() {
        let err = ValidatedForm::<Amount>::from_request(form_request("amount=0"), &())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, AppError::ValidationError(_)));
    }
}
