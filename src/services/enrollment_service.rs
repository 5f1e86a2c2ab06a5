use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::dynamodb::{FilterCondition, ReadOptions, RepositoryFactory, SimpleRepository};
use crate::models::{CourseSummary, UserCourse, UserCourseView};
use crate::services::{CourseService, ServiceResult, UserService};

/// Enrollments of users in courses.
pub struct EnrollmentService {
    repository: SimpleRepository<String, UserCourse>,
    courses: Arc<CourseService>,
    users: Arc<UserService>,
}

impl EnrollmentService {
    pub fn new(
        repository: SimpleRepository<String, UserCourse>,
        courses: Arc<CourseService>,
        users: Arc<UserService>,
    ) -> Self {
        Self {
            repository,
            courses,
            users,
        }
    }

    pub fn from_factory(
        factory: &RepositoryFactory,
        table_name: &str,
        key_name: &str,
        courses: Arc<CourseService>,
        users: Arc<UserService>,
    ) -> Self {
        Self::new(factory.get::<String, UserCourse>(table_name, key_name), courses, users)
    }

    /// Stores each enrollment under a fresh id and returns them as stored.
    ///
    /// Enrollments are written one at a time; a failure leaves the earlier ones in place.
    #[instrument(skip(self, enrollments), fields(count = enrollments.len()))]
    pub async fn enroll(&self, enrollments: Vec<UserCourse>) -> ServiceResult<Vec<UserCourse>> {
        let mut stored = Vec::with_capacity(enrollments.len());
        for mut enrollment in enrollments {
            enrollment.user_course_id = Uuid::new_v4().to_string();
            self.repository.insert(&enrollment).await?;
            stored.push(enrollment);
        }
        info!("Enrolled {} users", stored.len());
        Ok(stored)
    }

    /// Enrollments of `user_id`, joined with their courses.
    ///
    /// Enrollments whose course no longer exists are left out.
    #[instrument(skip(self))]
    pub async fn user_enrollments(&self, user_id: &str) -> ServiceResult<Vec<UserCourseView>> {
        let enrollments = self
            .repository
            .scan(
                &[FilterCondition::equal("UserId", user_id)],
                &ReadOptions::default(),
            )
            .await?;
        let courses = self.courses.get_all_courses().await?;
        let users = self.users.get_all_users().await?;

        let user_names: HashMap<&str, &str> = users
            .iter()
            .map(|user| (user.user_id.as_str(), user.name.as_str()))
            .collect();
        let user_names = &user_names;

        let views = enrollments
            .iter()
            .flat_map(|enrollment| {
                courses
                    .iter()
                    .filter(move |course| course.course_id == enrollment.course_id)
                    .map(move |course| {
                        let user_name = user_names.get(enrollment.user_id.as_str()).copied();
                        UserCourseView::new(enrollment, course, user_name)
                    })
            })
            .collect();
        Ok(views)
    }

    /// Student count per course, ordered by course id.
    #[instrument(skip(self))]
    pub async fn course_summary(&self) -> ServiceResult<Vec<CourseSummary>> {
        let enrollments = self.repository.scan(&[], &ReadOptions::default()).await?;

        let mut counts: BTreeMap<String, usize> = BTreeMap::new();
        for enrollment in enrollments {
            *counts.entry(enrollment.course_id).or_default() += 1;
        }

        Ok(counts
            .into_iter()
            .map(|(course_id, student_count)| CourseSummary {
                course_id,
                student_count,
            })
            .collect())
    }
}
