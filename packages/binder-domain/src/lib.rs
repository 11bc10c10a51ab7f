//! Pure domain rules for Binder: access resolution, view projection, and slug
//! allocation. Nothing in this crate performs I/O.

pub mod access;
pub mod project;
pub mod slug;
pub mod time_serde;

pub use access::{AccessLevel, Principal, Visibility, resolve};
pub use project::{
	CollaboratorProfile, CollectionDescriptor, CollectionView, NoteDescriptor, NoteView,
	project_tree,
};
pub use slug::{FALLBACK_SLUG, SlugError, allocate, slugify};
