//! Development seed data: two sample users, each with ten pre-analyzed
//! diary entries spread over the last ten days.

use anyhow::Result;
use chrono::{Duration, Utc};
use sea_orm::{ActiveModelTrait, EntityTrait, Set};

use super::Store;
use crate::entities::{diary_entries, users};
use crate::services::password;

struct SampleDiary {
    content: &'static str,
    analyzed_content: &'static str,
    positive_count: i32,
    negative_count: i32,
    days_ago: i64,
}

const SAMPLE_USERS: [(&str, &str); 2] = [
    ("alice@example.com", "Alice123!"),
    ("bob@example.com", "Bob123!"),
];

const SAMPLE_DIARIES: [SampleDiary; 10] = [
    SampleDiary {
        content: "I felt both excitement and anxious after I got elected to join a team for international math competition.",
        analyzed_content: r#"I felt both <span class="positive">excitement</span> and <span class="negative">anxious</span> after I got elected to join a team for international math competition."#,
        positive_count: 1,
        negative_count: 1,
        days_ago: 1,
    },
    SampleDiary {
        content: "Today was amazing! I finally completed my project and received wonderful feedback from my mentor. I feel accomplished and proud.",
        analyzed_content: r#"Today was <span class="positive">amazing</span>! I finally <span class="positive">completed</span> my project and received <span class="positive">wonderful</span> feedback from my mentor. I feel <span class="positive">accomplished</span> and <span class="positive">proud</span>."#,
        positive_count: 5,
        negative_count: 0,
        days_ago: 2,
    },
    SampleDiary {
        content: "I'm feeling overwhelmed with all the deadlines. Everything seems impossible and I can't stop worrying about failing.",
        analyzed_content: r#"I'm feeling <span class="negative">overwhelmed</span> with all the deadlines. Everything seems <span class="negative">impossible</span> and I can't stop <span class="negative">worrying</span> about <span class="negative">failing</span>."#,
        positive_count: 0,
        negative_count: 4,
        days_ago: 3,
    },
    SampleDiary {
        content: "Had a productive meeting with the team. We discussed the project timeline and assigned tasks.",
        analyzed_content: r#"Had a <span class="positive">productive</span> meeting with the team. We discussed the project timeline and assigned tasks."#,
        positive_count: 1,
        negative_count: 0,
        days_ago: 4,
    },
    SampleDiary {
        content: "I struggled with the coding problem for hours. It was frustrating, but I finally solved it and learned something new.",
        analyzed_content: r#"I <span class="negative">struggled</span> with the coding problem for hours. It was <span class="negative">frustrating</span>, but I finally <span class="positive">solved</span> it and <span class="positive">learned</span> something new."#,
        positive_count: 2,
        negative_count: 2,
        days_ago: 5,
    },
    SampleDiary {
        content: "Spent the afternoon at the park. Weather was nice. Read a book.",
        analyzed_content: r#"Spent the afternoon at the park. Weather was <span class="positive">nice</span>. Read a book."#,
        positive_count: 1,
        negative_count: 0,
        days_ago: 6,
    },
    SampleDiary {
        content: "Today I felt grateful for my supportive friends. They encouraged me when I was feeling down and helped me see the positive side.",
        analyzed_content: r#"Today I felt <span class="positive">grateful</span> for my <span class="positive">supportive</span> friends. They <span class="positive">encouraged</span> me when I was feeling <span class="negative">down</span> and helped me see the <span class="positive">positive</span> side."#,
        positive_count: 4,
        negative_count: 1,
        days_ago: 7,
    },
    SampleDiary {
        content: "Had a terrible day. Everything went wrong from the moment I woke up. Feeling stressed and disappointed.",
        analyzed_content: r#"Had a <span class="negative">terrible</span> day. Everything went <span class="negative">wrong</span> from the moment I woke up. Feeling <span class="negative">stressed</span> and <span class="negative">disappointed</span>."#,
        positive_count: 0,
        negative_count: 4,
        days_ago: 8,
    },
    SampleDiary {
        content: "Attended a workshop on mindfulness. It was interesting and gave me new techniques to manage stress.",
        analyzed_content: r#"Attended a workshop on mindfulness. It was <span class="positive">interesting</span> and gave me new techniques to manage stress."#,
        positive_count: 1,
        negative_count: 0,
        days_ago: 9,
    },
    SampleDiary {
        content: "Reflected on my progress this month. Some ups and downs, but overall I'm moving forward. Need to stay focused.",
        analyzed_content: r#"Reflected on my progress this month. Some ups and downs, but overall I'm <span class="positive">moving forward</span>. Need to stay <span class="positive">focused</span>."#,
        positive_count: 2,
        negative_count: 0,
        days_ago: 10,
    },
];

/// Populate the database with sample users and diary entries. Safe to run
/// repeatedly: existing users are reused instead of duplicated.
pub async fn run(store: &Store, fresh: bool) -> Result<()> {
    println!("Seeding database...");
    println!();

    if fresh {
        clear(store).await?;
    }

    // Entries are only created alongside their user, so a second run
    // leaves an already-seeded database untouched.
    let mut new_user_ids = Vec::new();
    for (email, password) in SAMPLE_USERS {
        if store.get_user_by_email(email).await?.is_some() {
            println!("User {email} already exists");
            continue;
        }

        let hash = password::hash_password(password).await?;
        let user = store.create_user(email, &hash).await?;
        println!("Created user: {email}");
        new_user_ids.push(user.id);
    }

    for user_id in &new_user_ids {
        for diary in &SAMPLE_DIARIES {
            let created_at = (Utc::now() - Duration::days(diary.days_ago)).to_rfc3339();

            let active = diary_entries::ActiveModel {
                user_id: Set(*user_id),
                content: Set(diary.content.to_string()),
                analyzed_content: Set(Some(diary.analyzed_content.to_string())),
                positive_count: Set(diary.positive_count),
                negative_count: Set(diary.negative_count),
                created_at: Set(created_at.clone()),
                updated_at: Set(created_at),
                ..Default::default()
            };
            active.insert(&store.conn).await?;
        }
        println!(
            "Created {} diary entries for user {user_id}",
            SAMPLE_DIARIES.len()
        );
    }

    println!();
    println!("{:-<60}", "");
    println!("Seeding complete!");
    println!("  Users:         {}", SAMPLE_USERS.len());
    println!(
        "  Diary entries: {}",
        SAMPLE_DIARIES.len() * new_user_ids.len()
    );

    Ok(())
}

async fn clear(store: &Store) -> Result<()> {
    diary_entries::Entity::delete_many().exec(&store.conn).await?;
    users::Entity::delete_many().exec(&store.conn).await?;
    println!("Cleared existing data");
    Ok(())
}
