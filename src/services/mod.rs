pub mod dialog;
pub mod feedback;
pub mod providers;
pub mod recommender;
pub mod session;

pub use dialog::DialogEngine;
pub use feedback::FeedbackRecorder;
pub use recommender::Recommender;
pub use session::SessionStore;
