//! Request body encoders selected per call: JSON, form-urlencoded, or multipart.
//!
//! Bodies are kept in an owned, re-playable form so the dispatcher can rebuild the exact same
//! request when it retries after a `401`.

// crates.io
use reqwest::{
	RequestBuilder,
	header::CONTENT_TYPE,
	multipart::{Form, Part},
};
// self
use crate::_prelude::*;

/// Failures raised while encoding a request payload; nothing is sent when one occurs.
#[derive(Debug, ThisError)]
pub enum EncodeError {
	/// Value could not be serialized as JSON.
	#[error("Request body could not be encoded as JSON.")]
	Json(#[from] serde_json::Error),
	/// A multipart file part declared an unparsable MIME type.
	#[error("Multipart part `{name}` has an invalid MIME type: {mime}.")]
	Mime {
		/// Part name.
		name: String,
		/// Offending MIME string.
		mime: String,
		/// Underlying parsing failure.
		#[source]
		source: ReqwestError,
	},
}

/// Payload attached to a call.
#[derive(Clone, Debug, Default)]
pub enum RequestBody {
	/// No body.
	#[default]
	Empty,
	/// Pre-encoded JSON document.
	Json(Vec<u8>),
	/// `application/x-www-form-urlencoded` pairs.
	Form(Vec<(String, String)>),
	/// `multipart/form-data` parts.
	Multipart(MultipartBody),
}
impl RequestBody {
	/// Encodes `value` as JSON.
	///
	/// `serde_json` never HTML-escapes, so `<`, `>`, and `&` reach the API verbatim.
	pub fn json<T>(value: &T) -> Result<Self, EncodeError>
	where
		T: ?Sized + Serialize,
	{
		Ok(Self::Json(serde_json::to_vec(value)?))
	}

	/// Builds a form-urlencoded body from key/value pairs.
	pub fn form<I, K, V>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self::Form(pairs.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}

	/// Wraps a multipart body.
	pub fn multipart(body: MultipartBody) -> Self {
		Self::Multipart(body)
	}

	/// Stable label used in spans and logs.
	pub const fn kind(&self) -> &'static str {
		match self {
			Self::Empty => "empty",
			Self::Json(_) => "json",
			Self::Form(_) => "form",
			Self::Multipart(_) => "multipart",
		}
	}

	/// Whether `status` counts as success for this kind of payload.
	///
	/// JSON and bodiless calls accept `200` only; form and multipart uploads also accept `201`.
	pub fn accepts(&self, status: StatusCode) -> bool {
		match self {
			Self::Empty | Self::Json(_) => status == StatusCode::OK,
			Self::Form(_) | Self::Multipart(_) =>
				status == StatusCode::OK || status == StatusCode::CREATED,
		}
	}

	/// Attaches the payload and its content type to `builder`.
	pub(crate) fn apply(&self, builder: RequestBuilder) -> Result<RequestBuilder, EncodeError> {
		Ok(match self {
			Self::Empty => builder,
			Self::Json(bytes) =>
				builder.header(CONTENT_TYPE, "application/json").body(bytes.clone()),
			Self::Form(pairs) => builder.form(pairs),
			Self::Multipart(body) => builder.multipart(body.to_form()?),
		})
	}
}

/// One part of a multipart body.
#[derive(Clone, Debug)]
pub enum MultipartPart {
	/// Plain text field.
	Text(String),
	/// File upload.
	File {
		/// Raw file contents.
		bytes: Vec<u8>,
		/// File name reported to the API.
		file_name: String,
		/// Optional MIME type.
		mime: Option<String>,
	},
}

/// Re-playable multipart body.
#[derive(Clone, Debug, Default)]
pub struct MultipartBody {
	/// Named parts in submission order.
	pub parts: Vec<(String, MultipartPart)>,
}
impl MultipartBody {
	/// Creates an empty body.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a text field.
	pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.parts.push((name.into(), MultipartPart::Text(value.into())));

		self
	}

	/// Appends a file part.
	pub fn file(
		mut self,
		name: impl Into<String>,
		file_name: impl Into<String>,
		bytes: impl Into<Vec<u8>>,
		mime: Option<&str>,
	) -> Self {
		self.parts.push((
			name.into(),
			MultipartPart::File {
				bytes: bytes.into(),
				file_name: file_name.into(),
				mime: mime.map(str::to_owned),
			},
		));

		self
	}

	fn to_form(&self) -> Result<Form, EncodeError> {
		let mut form = Form::new();

		for (name, part) in &self.parts {
			form = match part {
				MultipartPart::Text(value) => form.text(name.clone(), value.clone()),
				MultipartPart::File { bytes, file_name, mime } => {
					let mut file = Part::bytes(bytes.clone()).file_name(file_name.clone());

					if let Some(mime) = mime {
						file = file.mime_str(mime).map_err(|source| EncodeError::Mime {
							name: name.clone(),
							mime: mime.clone(),
							source,
						})?;
					}

					form.part(name.clone(), file)
				},
			};
		}

		Ok(form)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn json_is_not_html_escaped() {
		let body = RequestBody::json(&serde_json::json!({ "html": "<b>A & B</b>" }))
			.expect("JSON should encode.");

		match body {
			RequestBody::Json(bytes) =>
				assert_eq!(bytes, br#"{"html":"<b>A & B</b>"}"#.to_vec()),
			other => panic!("Unexpected body variant: {other:?}."),
		}
	}

	#[test]
	fn success_codes_depend_on_body_kind() {
		let json = RequestBody::json(&1).expect("JSON should encode.");
		let form = RequestBody::form([("email", "a@example.com")]);
		let multipart = RequestBody::multipart(MultipartBody::new().text("k", "v"));

		assert!(RequestBody::Empty.accepts(StatusCode::OK));
		assert!(!RequestBody::Empty.accepts(StatusCode::CREATED));
		assert!(!json.accepts(StatusCode::CREATED));
		assert!(form.accepts(StatusCode::CREATED));
		assert!(multipart.accepts(StatusCode::CREATED));
		assert!(!multipart.accepts(StatusCode::ACCEPTED));
	}

	#[test]
	fn invalid_mime_is_an_encode_error() {
		let body = MultipartBody::new().file("file", "a.txt", b"abc".to_vec(), Some("not a mime"));
		let err = body.to_form().expect_err("Invalid MIME must be rejected.");

		assert!(matches!(err, EncodeError::Mime { ref name, .. } if name == "file"));
	}

	#[test]
	fn encode_failure_surfaces_as_json_error() {
		let mut map = std::collections::BTreeMap::new();

		map.insert(vec![1_u8], "non-string key");

		let err = RequestBody::json(&map).expect_err("Non-string map keys cannot be JSON.");

		assert!(matches!(err, EncodeError::Json(_)));
	}
}
