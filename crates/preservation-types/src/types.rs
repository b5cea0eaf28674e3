//! Core identity and state types

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::SystemTime;

/// Capability that marks a principal as a site administrator
pub const ADMIN_CAPABILITY: &str = "manage_settings";

// Timestamp //
//***********//
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub i64);

impl Timestamp {
	pub fn now() -> Timestamp {
		let res = SystemTime::now().duration_since(SystemTime::UNIX_EPOCH).unwrap_or_default();
		Timestamp(i64::try_from(res.as_secs()).unwrap_or(i64::MAX))
	}

	pub fn add_seconds(&self, seconds: i64) -> Timestamp {
		Timestamp(self.0.saturating_add(seconds))
	}
}

impl std::fmt::Display for Timestamp {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl Serialize for Timestamp {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: serde::Serializer,
	{
		serializer.serialize_i64(self.0)
	}
}

impl<'de> Deserialize<'de> for Timestamp {
	fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
	where
		D: serde::Deserializer<'de>,
	{
		Ok(Timestamp(i64::deserialize(deserializer)?))
	}
}

// Capabilities //
//**************//
/// Capability names granted to a principal by the external capability model
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capabilities(BTreeSet<Box<str>>);

impl Capabilities {
	pub fn new() -> Self {
		Self(BTreeSet::new())
	}

	pub fn contains(&self, capability: &str) -> bool {
		self.0.contains(capability)
	}

	pub fn insert(&mut self, capability: impl Into<Box<str>>) -> bool {
		self.0.insert(capability.into())
	}

	pub fn remove(&mut self, capability: &str) -> bool {
		self.0.remove(capability)
	}

	pub fn retain(&mut self, f: impl FnMut(&Box<str>) -> bool) {
		self.0.retain(f);
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.0.iter().map(AsRef::as_ref)
	}

	pub fn len(&self) -> usize {
		self.0.len()
	}

	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}

impl<S: Into<Box<str>>> FromIterator<S> for Capabilities {
	fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
		Self(iter.into_iter().map(Into::into).collect())
	}
}

// Principal //
//***********//
/// The acting identity of a request.
///
/// Inserted into request extensions by the host's authentication layer.
/// Requests without one are handled as [`Principal::anonymous`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Principal {
	pub id_tag: Box<str>,
	pub capabilities: Capabilities,
}

impl Principal {
	pub fn new(id_tag: impl Into<Box<str>>, capabilities: Capabilities) -> Self {
		Self { id_tag: id_tag.into(), capabilities }
	}

	pub fn anonymous() -> Self {
		Self { id_tag: "".into(), capabilities: Capabilities::new() }
	}

	pub fn is_anonymous(&self) -> bool {
		self.id_tag.is_empty()
	}

	pub fn has_admin_capability(&self) -> bool {
		self.capabilities.contains(ADMIN_CAPABILITY)
	}

	pub fn can(&self, capability: &str) -> bool {
		self.capabilities.contains(capability)
	}
}

// SessionId //
//***********//
/// Opaque identifier of the authenticated session, set by the host auth layer
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct SessionId(pub Box<str>);

impl SessionId {
	pub fn new(id: impl Into<Box<str>>) -> Self {
		Self(id.into())
	}
}

impl std::fmt::Display for SessionId {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.0)
	}
}

// LockState //
//***********//
/// Snapshot of the preservation lock taken once per request
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct LockState {
	pub enabled: bool,
}

impl LockState {
	pub fn new(enabled: bool) -> Self {
		Self { enabled }
	}
}

// ApiResponse //
//*************//
/// Envelope for successful JSON responses
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
	pub data: T,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub req_id: Option<String>,
}

impl<T> ApiResponse<T> {
	pub fn new(data: T) -> Self {
		Self { data, req_id: None }
	}

	pub fn with_req_id(mut self, req_id: Option<String>) -> Self {
		self.req_id = req_id;
		self
	}
}


// vim: ts=4
