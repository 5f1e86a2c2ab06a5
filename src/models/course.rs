use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Course {
    pub course_id: String,
    pub course_name: String,
    pub category: Option<String>,
    pub course_content: Option<String>,
    pub sub_topics: Option<String>,
    pub link: Option<String>,
    /// Author of the course.
    pub user_id: Option<String>,
    pub status: Option<String>,
    pub due_date: Option<String>,
    pub student_count: i32,
}

crate::record!(Course {
    course_id: "CourseId",
    course_name: "CourseName",
    category: "Category",
    course_content: "CourseContent",
    sub_topics: "SubTopics",
    link: "Link",
    user_id: "UserId",
    status: "Status",
    due_date: "DueDate",
    student_count: "StudentCount",
});
