use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::header::CONTENT_TYPE;
use axum::http::request::Parts;
use axum::{async_trait, Form, Json};
use serde::de::DeserializeOwned;

use crate::error::RequestError;

/// How the client encoded a request body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyFormat {
    Json,
    Form,
}

impl BodyFormat {
    fn of(request: &Request) -> Self {
        let is_json = request
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.starts_with("application/json"));
        if is_json {
            Self::Json
        } else {
            Self::Form
        }
    }
}

/// Request body accepted either as JSON or as an urlencoded form.
///
/// Anything that is not `application/json` goes through the form
/// extractor, which rejects unknown content types itself.
#[derive(Debug)]
pub struct Payload<T>(pub T, pub BodyFormat);

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = RequestError;

    async fn from_request(request: Request, state: &S) -> Result<Self, Self::Rejection> {
        match BodyFormat::of(&request) {
            BodyFormat::Json => {
                let Json(value) = Json::<T>::from_request(request, state).await?;
                Ok(Self(value, BodyFormat::Json))
            }
            BodyFormat::Form => {
                let Form(value) = Form::<T>::from_request(request, state).await?;
                Ok(Self(value, BodyFormat::Form))
            }
        }
    }
}

/// `Query` that rejects with a JSON `{ "err": ... }` body.
#[derive(Debug)]
pub struct ApiQuery<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiQuery<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = RequestError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}

/// `Path` that rejects with a JSON `{ "err": ... }` body.
#[derive(Debug)]
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<S, T> FromRequestParts<S> for ApiPath<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Send,
{
    type Rejection = RequestError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state).await?;
        Ok(Self(value))
    }
}
