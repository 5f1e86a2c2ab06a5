//! Records stored by the learning-management tables.

mod course;
mod user;
mod user_course;

pub use course::Course;
pub use user::User;
pub use user_course::{CourseSummary, UserCourse, UserCourseView};
