//! Pure projections over store snapshots.

pub mod timeline_view;
