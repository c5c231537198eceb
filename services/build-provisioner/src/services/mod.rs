pub mod object_store;
pub mod provisioner;
pub mod reconciler;
