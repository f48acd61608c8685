use sqlx::SqlitePool;
use tracing::info;

use crate::error::AppResult;

/// A catalog row inserted on first start
struct SeedEntry {
    id: i64,
    title: &'static str,
    genre: &'static str,
    depth: &'static str,
    features: &'static str,
    kind: &'static str,
    description: &'static str,
    rating: f64,
    year: i32,
}

const SEED_CONTENT: &[SeedEntry] = &[
    SeedEntry {
        id: 1,
        title: "Начало",
        genre: "sci-fi,thriller",
        depth: "deep",
        features: "action,mystery",
        kind: "movie",
        description: "Фильм о воре, который крадет корпоративные секреты через использование технологии совместного сна.",
        rating: 8.8,
        year: 2010,
    },
    SeedEntry {
        id: 2,
        title: "Ла-Ла Ленд",
        genre: "romance,drama",
        depth: "light",
        features: "music,romance",
        kind: "movie",
        description: "Музыкальная история любви джазового пианиста и начинающей актрисы в Лос-Анджелесе.",
        rating: 8.0,
        year: 2016,
    },
    SeedEntry {
        id: 3,
        title: "Атака титанов",
        genre: "action,fantasy",
        depth: "deep",
        features: "action,drama",
        kind: "anime",
        description: "Аниме-сериал о борьбе человечества против гигантских людоедов в постапокалиптическом мире.",
        rating: 9.0,
        year: 2013,
    },
    SeedEntry {
        id: 4,
        title: "Твоё имя",
        genre: "romance,fantasy",
        depth: "medium",
        features: "romance,drama",
        kind: "anime",
        description: "История о двух подростках, которые обнаруживают, что таинственным образом меняются телами.",
        rating: 8.4,
        year: 2016,
    },
    SeedEntry {
        id: 5,
        title: "Джон Уик",
        genre: "action,thriller",
        depth: "light",
        features: "action,violence",
        kind: "movie",
        description: "Бывший наемный убийца вынужден вернуться к своему темному прошлому, чтобы отомстить.",
        rating: 7.4,
        year: 2014,
    },
    SeedEntry {
        id: 6,
        title: "Интерстеллар",
        genre: "sci-fi,drama",
        depth: "deep",
        features: "space,science",
        kind: "movie",
        description: "Фильм о группе исследователей, которые используют недавно обнаруженный пространственный тоннель, чтобы преодолеть ограничения космических путешествий.",
        rating: 8.6,
        year: 2014,
    },
    SeedEntry {
        id: 7,
        title: "Ванпанчмен",
        genre: "comedy,action",
        depth: "light",
        features: "action,humor",
        kind: "anime",
        description: "Аниме о супергерое, который может победить любого противника одним ударом и страдает от этого.",
        rating: 8.8,
        year: 2015,
    },
    SeedEntry {
        id: 8,
        title: "Паразит",
        genre: "horror,sci-fi",
        depth: "deep",
        features: "horror,drama",
        kind: "anime",
        description: "Аниме о паразитических существах, которые захватывают и контролируют мозг людей.",
        rating: 8.5,
        year: 2014,
    },
    SeedEntry {
        id: 9,
        title: "Шрек",
        genre: "comedy,fantasy",
        depth: "light",
        features: "humor,romance",
        kind: "movie",
        description: "Анимационный фильм о приключениях огра и его друзей в сказочном королевстве.",
        rating: 7.9,
        year: 2001,
    },
    SeedEntry {
        id: 10,
        title: "Унесённые призраками",
        genre: "fantasy,adventure",
        depth: "medium",
        features: "fantasy,drama",
        kind: "anime",
        description: "Аниме о девочке, которая попадает в мир духов и должна найти способ спасти своих родителей.",
        rating: 8.6,
        year: 2001,
    },
    SeedEntry {
        id: 11,
        title: "Пульп Фикшн",
        genre: "crime,drama",
        depth: "deep",
        features: "violence,humor",
        kind: "movie",
        description: "Нелинейное повествование о криминальном мире Лос-Анджелеса.",
        rating: 8.9,
        year: 1994,
    },
    SeedEntry {
        id: 12,
        title: "Ковбой Бибоп",
        genre: "sci-fi,action",
        depth: "medium",
        features: "action,space",
        kind: "anime",
        description: "Аниме о группе охотников за головами в космосе будущего.",
        rating: 8.9,
        year: 1998,
    },
    SeedEntry {
        id: 13,
        title: "Тёмный рыцарь",
        genre: "action,crime",
        depth: "deep",
        features: "action,drama",
        kind: "movie",
        description: "Фильм о борьбе Бэтмена с криминальным гением Джокером.",
        rating: 9.0,
        year: 2008,
    },
    SeedEntry {
        id: 14,
        title: "Твин Пикс",
        genre: "mystery,drama",
        depth: "deep",
        features: "mystery,horror",
        kind: "movie",
        description: "Сериал о расследовании убийства молодой девушки в маленьком городке.",
        rating: 8.8,
        year: 1990,
    },
    SeedEntry {
        id: 15,
        title: "Клинок, рассекающий демонов",
        genre: "action,fantasy",
        depth: "medium",
        features: "action,drama",
        kind: "anime",
        description: "Аниме о мальчике, который становится охотником на демонов после того, как его семья была убита.",
        rating: 8.7,
        year: 2019,
    },
];

/// Inserts the starter catalog, skipping rows whose ids already exist
///
/// Existing rows keep their accumulated likes, dislikes and recomputed
/// ratings across restarts.
pub async fn seed_catalog(pool: &SqlitePool) -> AppResult<()> {
    let mut inserted = 0u32;

    for entry in SEED_CONTENT {
        let result = sqlx::query(
            "INSERT OR IGNORE INTO content \
                 (id, title, genre, depth, features, type, description, rating, likes, dislikes, year) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, 0, 0, ?)",
        )
        .bind(entry.id)
        .bind(entry.title)
        .bind(entry.genre)
        .bind(entry.depth)
        .bind(entry.features)
        .bind(entry.kind)
        .bind(entry.description)
        .bind(entry.rating)
        .bind(entry.year)
        .execute(pool)
        .await?;

        inserted += result.rows_affected() as u32;
    }

    info!(inserted = inserted, total = SEED_CONTENT.len(), "Catalog seeded");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_pool, SqliteStore, Store};
    use crate::models::FeedbackKind;

    async fn seeded_store() -> SqliteStore {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let store = SqliteStore::new(pool);
        store.migrate().await.unwrap();
        seed_catalog(store.pool()).await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_seed_inserts_full_catalog() {
        let store = seeded_store().await;
        let catalog = store.catalog().await.unwrap();
        assert_eq!(catalog.len(), 15);
        assert_eq!(catalog[0].title, "Начало");
        assert_eq!(catalog[14].title, "Клинок, рассекающий демонов");
    }

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let store = seeded_store().await;
        seed_catalog(store.pool()).await.unwrap();
        assert_eq!(store.catalog().await.unwrap().len(), 15);
    }

    #[tokio::test]
    async fn test_seed_preserves_accumulated_feedback() {
        let store = seeded_store().await;
        store.record_feedback(1, 5, FeedbackKind::Like).await.unwrap();

        // A restart reruns the seeder; vote counts must survive.
        seed_catalog(store.pool()).await.unwrap();

        let content = store.content_by_id(5).await.unwrap();
        assert_eq!(content.likes, 1);
        assert_eq!(content.rating, 10.0);
    }
}
