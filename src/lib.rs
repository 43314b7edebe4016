//! Authenticated, rate-limited request engine for the SendPulse marketing-automation REST API.
//!
//! Every resource call (address books, campaigns, templates, bots, SMTP, push, SMS) funnels
//! through [`Client`]: it waits on a shared token bucket, attaches a cached OAuth bearer token
//! obtained through the client-credentials grant, retries exactly once when the API reports the
//! token as invalid, and classifies failures into [`error::Error`].

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod body;
pub mod cancel;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod http;
pub mod obs;
pub mod rate_limit;

pub use cancel::Cancellation;
pub use config::{ClientConfig, Credentials};
pub use dispatch::{Call, Client, ResultEnvelope};

mod _prelude {
	pub use std::{
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		num::NonZeroU32,
		sync::Arc,
		time::Duration,
	};

	pub use parking_lot::RwLock;
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError, Method, StatusCode};
	pub use serde::{Deserialize, Serialize, de::DeserializeOwned};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use url::Url;

	pub use crate::error::Result;
}

pub use reqwest;
pub use tokio_util::sync::CancellationToken;
pub use url;
#[cfg(test)] use {color_eyre as _, httpmock as _};
