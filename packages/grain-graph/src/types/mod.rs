pub mod claim;
pub mod extraction;
pub mod topic;
