mod observation;

pub use observation::{CorrespondenceSet, ReprojectionStats};
