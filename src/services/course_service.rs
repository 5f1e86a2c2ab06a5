use aws_sdk_dynamodb::types::ReturnValue;
use tracing::{info, instrument};

use crate::dynamodb::{ReadOptions, RepositoryFactory, SimpleRepository};
use crate::models::Course;
use crate::services::{ServiceError, ServiceResult};

pub struct CourseService {
    repository: SimpleRepository<String, Course>,
}

impl CourseService {
    pub fn new(repository: SimpleRepository<String, Course>) -> Self {
        Self { repository }
    }

    pub fn from_factory(factory: &RepositoryFactory, table_name: &str, key_name: &str) -> Self {
        Self::new(factory.get::<String, Course>(table_name, key_name))
    }

    #[instrument(skip(self))]
    pub async fn get_course(&self, id: &str) -> ServiceResult<Course> {
        self.repository
            .get(&id.to_string(), None)
            .await?
            .ok_or_else(|| ServiceError::CourseNotFound { id: id.to_string() })
    }

    #[instrument(skip(self))]
    pub async fn get_all_courses(&self) -> ServiceResult<Vec<Course>> {
        let courses = self.repository.scan(&[], &ReadOptions::default()).await?;
        info!("Found {} courses", courses.len());
        Ok(courses)
    }

    #[instrument(skip(self, course), fields(course_id = %course.course_id))]
    pub async fn create_course(&self, course: &Course) -> ServiceResult<()> {
        if course.course_id.is_empty() {
            return Err(ServiceError::ValidationError {
                message: "Course ID cannot be empty".to_string(),
            });
        }
        self.repository.insert(course).await?;
        Ok(())
    }

    #[instrument(skip(self, course), fields(course_id = %course.course_id))]
    pub async fn update_course(&self, course: &Course) -> ServiceResult<Course> {
        self.repository
            .partial_update(course, ReturnValue::AllNew)
            .await?
            .ok_or_else(|| ServiceError::CourseNotFound {
                id: course.course_id.clone(),
            })
    }

    #[instrument(skip(self))]
    pub async fn delete_course(&self, id: &str) -> ServiceResult<()> {
        self.repository.delete(&id.to_string(), None).await?;
        Ok(())
    }
}
