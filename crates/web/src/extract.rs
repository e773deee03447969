//! Request body extractors.

use axum::{
    Form, Json,
    extract::{FromRequest, Request},
    http::header,
};
use serde::de::DeserializeOwned;

use crate::error::AppError;

/// A body submitted either as JSON or as an HTML form.
///
/// JSON is chosen when `Content-Type` is `application/json`; anything else
/// is read as `application/x-www-form-urlencoded`. Handlers use `is_json` to
/// pick between a JSON reply and a page or redirect.
#[derive(Debug)]
pub struct Submission<T> {
    pub data: T,
    pub is_json: bool,
}

impl<S, T> FromRequest<S> for Submission<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_json = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.trim_start().starts_with("application/json"));

        let data = if is_json {
            let Json(data) = Json::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            data
        } else {
            let Form(data) = Form::<T>::from_request(req, state)
                .await
                .map_err(|e| AppError::BadRequest(e.body_text()))?;
            data
        };

        Ok(Self { data, is_json })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;
    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Login {
        cpf: String,
    }

    #[tokio::test]
    async fn test_reads_json() {
        let req = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(r#"{"cpf":"52998224725"}"#))
            .unwrap();
        let submission = Submission::<Login>::from_request(req, &()).await.unwrap();
        assert!(submission.is_json);
        assert_eq!(submission.data.cpf, "52998224725");
    }

    #[tokio::test]
    async fn test_reads_form() {
        let req = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from("cpf=529.982.247-25"))
            .unwrap();
        let submission = Submission::<Login>::from_request(req, &()).await.unwrap();
        assert!(!submission.is_json);
        assert_eq!(submission.data.cpf, "529.982.247-25");
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let req = Request::builder()
            .method("POST")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let err = Submission::<Login>::from_request(req, &()).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
