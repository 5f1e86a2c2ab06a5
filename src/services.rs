//! Business operations over the learning-management tables.

use std::sync::Arc;
use thiserror::Error;

use crate::config::AppConfig;
use crate::dynamodb::RepositoryFactory;
use crate::error::RepositoryError;

mod course_service;
mod enrollment_service;
mod user_service;

pub use course_service::CourseService;
pub use enrollment_service::EnrollmentService;
pub use user_service::UserService;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("User not found: {id}")]
    UserNotFound { id: String },

    #[error("Course not found: {id}")]
    CourseNotFound { id: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },

    #[error("Repository error: {source}")]
    Repository {
        #[from]
        source: RepositoryError,
    },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// The services of one application instance, sharing one factory.
pub struct LmsServices {
    pub users: Arc<UserService>,
    pub courses: Arc<CourseService>,
    pub enrollments: EnrollmentService,
}

impl LmsServices {
    pub fn new(factory: &RepositoryFactory, config: &AppConfig) -> Self {
        let users = Arc::new(UserService::from_factory(
            factory,
            &config.user_table,
            &config.user_key,
        ));
        let courses = Arc::new(CourseService::from_factory(
            factory,
            &config.course_table,
            &config.course_key,
        ));
        let enrollments = EnrollmentService::from_factory(
            factory,
            &config.user_course_table,
            &config.user_course_key,
            Arc::clone(&courses),
            Arc::clone(&users),
        );

        Self {
            users,
            courses,
            enrollments,
        }
    }
}
