use anyhow::Result;
use elms_dynamo::models::{Course, User, UserCourse};
use elms_dynamo::services::{LmsServices, ServiceError};
use serde::Serialize;
use std::io::{self, Write};
use tracing::info;

/// Runs the interactive console over the learning-management services.
///
/// The supported commands are:
/// - users: List all users
/// - user: Show one user
/// - raw_user: Show one user's stored attributes as plain JSON
/// - add_user: Create a user
/// - delete_user: Delete a user
/// - courses: List all courses
/// - add_course: Create a course
/// - enroll: Enroll a user in one or more courses
/// - enrollments: List a user's enrollments with their courses
/// - summary: Student count per course
/// - exit: Exit the program
///
/// A failing command prints its error and the loop continues.
pub async fn run(services: &LmsServices) -> Result<()> {
    loop {
        let command = prompt(
            "Enter command (users/user/raw_user/add_user/delete_user/courses/add_course/enroll/enrollments/summary/exit)",
            None,
        )?;
        let outcome = match command.as_str() {
            "users" => list_users(services).await,
            "user" => show_user(services).await,
            "raw_user" => show_raw_user(services).await,
            "add_user" => add_user(services).await,
            "delete_user" => delete_user(services).await,
            "courses" => list_courses(services).await,
            "add_course" => add_course(services).await,
            "enroll" => enroll(services).await,
            "enrollments" => list_enrollments(services).await,
            "summary" => summary(services).await,
            "exit" => break,
            _ => {
                println!("Unknown command. Please try again.");
                Ok(())
            }
        };

        if let Err(e) = outcome {
            println!("Error: {e}");
        }
    }
    Ok(())
}

async fn list_users(services: &LmsServices) -> Result<()> {
    let users = services.users.get_all_users().await?;
    print_json("Users", &users)
}

async fn show_user(services: &LmsServices) -> Result<()> {
    let id = prompt("Enter user id", Some("u1"))?;
    match services.users.get_user(&id).await {
        Ok(user) => print_json("User", &[user]),
        Err(ServiceError::UserNotFound { id }) => {
            println!("No user with id '{id}'");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

async fn show_raw_user(services: &LmsServices) -> Result<()> {
    let id = prompt("Enter user id", Some("u1"))?;
    let document = services.users.get_user_document(&id).await?;
    println!("{}", serde_json::to_string_pretty(&document.to_json()?)?);
    Ok(())
}

async fn add_user(services: &LmsServices) -> Result<()> {
    let user = User {
        user_id: prompt("Enter user id", Some("u1"))?,
        name: prompt("Enter name", Some("Ann"))?,
        role: prompt_optional("Enter role", Some("Student"))?,
        city: prompt_optional("Enter city", None)?,
        state: prompt_optional("Enter state", None)?,
        pin: prompt_optional("Enter pin", None)?,
        phone: prompt_optional("Enter phone", None)?,
        email: prompt_optional("Enter email", Some("ann@example.com"))?,
        password: prompt_optional("Enter password", None)?,
        point_of_contact: prompt_number("Enter point of contact", 0)?,
    };
    services.users.create_user(&user).await?;
    info!("User '{}' created", user.user_id);
    println!("User created successfully");
    Ok(())
}

async fn delete_user(services: &LmsServices) -> Result<()> {
    let id = prompt("Enter user id", Some("u1"))?;
    services.users.delete_user(&id).await?;
    println!("User deleted successfully");
    Ok(())
}

async fn list_courses(services: &LmsServices) -> Result<()> {
    let courses = services.courses.get_all_courses().await?;
    print_json("Courses", &courses)
}

async fn add_course(services: &LmsServices) -> Result<()> {
    let course = Course {
        course_id: prompt("Enter course id", Some("c1"))?,
        course_name: prompt("Enter course name", Some("Intro to Rust"))?,
        category: prompt_optional("Enter category", Some("Programming"))?,
        course_content: prompt_optional("Enter course content", None)?,
        sub_topics: prompt_optional("Enter sub topics", None)?,
        link: prompt_optional("Enter link", None)?,
        user_id: prompt_optional("Enter author user id", None)?,
        status: prompt_optional("Enter status", Some("Active"))?,
        due_date: prompt_optional("Enter due date", Some("2025-01-31"))?,
        student_count: 0,
    };
    services.courses.create_course(&course).await?;
    println!("Course created successfully");
    Ok(())
}

async fn enroll(services: &LmsServices) -> Result<()> {
    let user_id = prompt("Enter user id", Some("u1"))?;
    let course_ids = prompt("Enter course ids, comma separated", Some("c1,c2"))?;
    let enrollments = parse_course_ids(&course_ids)
        .into_iter()
        .map(|course_id| UserCourse {
            user_id: user_id.clone(),
            course_id,
            ..Default::default()
        })
        .collect();

    let stored = services.enrollments.enroll(enrollments).await?;
    print_json("Enrollments", &stored)
}

async fn list_enrollments(services: &LmsServices) -> Result<()> {
    let user_id = prompt("Enter user id", Some("u1"))?;
    let views = services.enrollments.user_enrollments(&user_id).await?;
    print_json("Enrollments", &views)
}

async fn summary(services: &LmsServices) -> Result<()> {
    let summary = services.enrollments.course_summary().await?;
    print_json("Course Summary", &summary)
}

fn parse_course_ids(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .collect()
}

fn print_json<T: Serialize>(title: &str, items: &[T]) -> Result<()> {
    println!("\n--- {} ---", title);
    for item in items {
        println!("{}", serde_json::to_string_pretty(item)?);
    }
    println!("{}", "-".repeat(title.len() + 8));
    Ok(())
}

fn prompt(message: &str, example: Option<&str>) -> Result<String> {
    let full_message = if let Some(ex) = example {
        format!("{} (e.g., {}): ", message, ex)
    } else {
        format!("{}: ", message)
    };
    print!("{}", full_message);
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

fn prompt_optional(message: &str, example: Option<&str>) -> Result<Option<String>> {
    let input = prompt(message, example)?;
    Ok(if input.is_empty() { None } else { Some(input) })
}

fn prompt_number(message: &str, default: i32) -> Result<i32> {
    let input = prompt(message, Some(&default.to_string()))?;
    Ok(input.parse().unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_course_ids() {
        assert_eq!(parse_course_ids(" c1, c2 ,,c3 "), vec!["c1", "c2", "c3"]);
        assert!(parse_course_ids("   ").is_empty());
    }
}
