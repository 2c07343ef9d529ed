pub mod framing_validator;
pub mod lighting_assessor;
pub mod pose_classifier;
