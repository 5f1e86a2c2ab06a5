use serde::{Deserialize, Serialize};

use crate::models::Course;

/// Enrollment of a user in a course.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserCourse {
    pub user_course_id: String,
    pub user_id: String,
    pub course_id: String,
    pub progress: i32,
    pub credits: i32,
}

crate::record!(UserCourse {
    user_course_id: "UserCourseId",
    user_id: "UserId",
    course_id: "CourseId",
    progress: "Progress",
    credits: "Credits",
});

/// An enrollment joined with its course and the enrolled user's name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserCourseView {
    pub user_id: String,
    /// Empty when the user no longer exists.
    pub user_name: String,
    pub course_id: String,
    pub course_name: String,
    pub category: String,
    pub course_content: String,
    pub sub_topics: String,
    pub link: String,
    pub status: String,
    pub due_date: String,
    pub progress: i32,
    pub credits: i32,
}

impl UserCourseView {
    pub const DEFAULT_STATUS: &'static str = "Active";

    pub fn new(enrollment: &UserCourse, course: &Course, user_name: Option<&str>) -> Self {
        let status = course
            .status
            .as_deref()
            .filter(|status| !status.is_empty())
            .unwrap_or(Self::DEFAULT_STATUS);

        Self {
            user_id: enrollment.user_id.clone(),
            user_name: user_name.unwrap_or_default().to_string(),
            course_id: enrollment.course_id.clone(),
            course_name: course.course_name.clone(),
            category: course.category.clone().unwrap_or_default(),
            course_content: course.course_content.clone().unwrap_or_default(),
            sub_topics: course.sub_topics.clone().unwrap_or_default(),
            link: course.link.clone().unwrap_or_default(),
            status: status.to_string(),
            due_date: course.due_date.clone().unwrap_or_default(),
            progress: enrollment.progress,
            credits: enrollment.credits,
        }
    }
}

/// Number of students enrolled in one course.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CourseSummary {
    pub course_id: String,
    pub student_count: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_defaults_empty_status_to_active() {
        let enrollment = UserCourse {
            user_course_id: "uc1".to_string(),
            user_id: "u1".to_string(),
            course_id: "c1".to_string(),
            progress: 40,
            credits: 3,
        };
        let course = Course {
            course_id: "c1".to_string(),
            course_name: "Rust".to_string(),
            ..Default::default()
        };

        let view = UserCourseView::new(&enrollment, &course, Some("Ann"));
        assert_eq!(view.status, "Active");
        assert_eq!(view.user_name, "Ann");
        assert_eq!(view.progress, 40);

        let completed = Course {
            status: Some("Completed".to_string()),
            ..course
        };
        let view = UserCourseView::new(&enrollment, &completed, None);
        assert_eq!(view.status, "Completed");
        assert_eq!(view.user_name, "");
    }
}
