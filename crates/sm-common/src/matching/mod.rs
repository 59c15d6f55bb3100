pub mod location;
pub mod pipeline;
pub mod prefilter;
pub mod proficiency;
pub mod recommend;
pub mod scoring;
pub mod skills;
pub mod weights;
