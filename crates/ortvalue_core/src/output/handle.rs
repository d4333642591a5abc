use std::fmt;
use std::marker::PhantomData;

use tracing::{error, trace};

use crate::output::{NativeApi, RawHandle};

/// Move-only ownership token over one native value handle.
///
/// At most one owning token exists per native handle. Ownership leaves a
/// token only through [`disown`](OwnedHandle::disown), and the handle is
/// released only through [`dispose`](OwnedHandle::dispose), which also runs
/// on drop.
pub struct OwnedHandle<'a> {
	api: &'a dyn NativeApi,
	raw: RawHandle,
	owning: bool,
}

impl<'a> OwnedHandle<'a> {
	/// Take ownership of a raw value handle.
	///
	/// # Safety
	///
	/// `raw` must be a live value handle produced by `api` that the caller
	/// owns, and no other owning token may exist for it.
	pub unsafe fn from_raw(api: &'a dyn NativeApi, raw: RawHandle) -> Self {
		Self { api, raw, owning: true }
	}

	/// Return the wrapped handle, null after disposal.
	pub fn raw(&self) -> RawHandle {
		self.raw
	}

	/// Return whether this token is responsible for releasing the handle.
	pub fn is_owning(&self) -> bool {
		self.owning
	}

	/// Return whether the token has been disposed.
	pub fn is_disposed(&self) -> bool {
		self.raw.is_null()
	}

	/// Lend a non-owning reference for read-only passing.
	pub fn borrow(&self) -> BorrowedHandle<'_> {
		BorrowedHandle {
			raw: self.raw,
			_owner: PhantomData,
		}
	}

	/// Transfer ownership to a new token.
	///
	/// The source stays permanently non-owning; a second call, or a call on a
	/// non-owning or disposed token, returns `None`.
	pub fn disown(&mut self) -> Option<OwnedHandle<'a>> {
		if !self.owning || self.raw.is_null() {
			return None;
		}
		self.owning = false;
		Some(Self {
			api: self.api,
			raw: self.raw,
			owning: true,
		})
	}

	/// Release the handle if owning, then clear it. Idempotent.
	pub fn dispose(&mut self) {
		if self.owning && !self.raw.is_null() {
			match self.api.release_value(self.raw) {
				Ok(()) => trace!(handle = ?self.raw, "released native value"),
				Err(status) => {
					// A failing release means the handle was already freed or corrupted.
					error!(handle = ?self.raw, %status, "native release failed");
					debug_assert!(false, "native release failed for {:?}: {status}", self.raw);
				}
			}
		}
		self.owning = false;
		self.raw = RawHandle::null();
	}

	pub(crate) fn api(&self) -> &'a dyn NativeApi {
		self.api
	}
}

impl Drop for OwnedHandle<'_> {
	fn drop(&mut self) {
		self.dispose();
	}
}

impl fmt::Debug for OwnedHandle<'_> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("OwnedHandle").field("raw", &self.raw).field("owning", &self.owning).finish()
	}
}

/// Non-owning reference to a handle held by an [`OwnedHandle`].
///
/// Never releases anything and cannot outlive its owner.
#[derive(Debug, Clone, Copy)]
pub struct BorrowedHandle<'h> {
	raw: RawHandle,
	_owner: PhantomData<&'h ()>,
}

impl BorrowedHandle<'_> {
	/// Return the referenced handle.
	pub fn raw(&self) -> RawHandle {
		self.raw
	}
}
