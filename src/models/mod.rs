//! Data models
//!
//! Wire types exchanged with the platform API:
//! - Learning entities (Template, Step, Enrollment, StepProgress, Answer)
//! - Content hierarchy (Category, Book, Chapter, Section, ParagraphVersion)
//! - Authentication payloads

mod answer;
mod content;
mod enrollment;
mod progress;
mod session;
mod template;

pub use answer::{AddAnswerInput, Answer, AnswerType};
pub use content::{Book, Category, Chapter, ParagraphVersion, Section};
pub use enrollment::{Enrollment, StartEnrollmentInput};
pub use progress::{ProgressStatus, StepProgress, UpdateProgressInput};
pub use session::{AuthTokens, Credentials, LoginResponse, RefreshTokenRequest, User, UserStatus};
pub use template::{sort_steps, CreateTemplateInput, Step, Template};
