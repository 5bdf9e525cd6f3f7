//! Default chord-progression catalog

use crate::models::{Category, Difficulty, Mode};
use crate::{time, uuid_utils, Result};
use sqlx::SqlitePool;
use tracing::info;

/// A catalog entry seeded into an empty `chord_progressions` table
#[derive(Debug, Clone, Copy)]
pub struct SeedProgression {
    pub name: &'static str,
    pub degrees: &'static [&'static str],
    pub difficulty: Difficulty,
    pub category: Category,
    pub mode: Mode,
    pub tempo: i64,
    pub description: &'static str,
}

pub const DEFAULT_PROGRESSIONS: &[SeedProgression] = &[
    SeedProgression {
        name: "Pop Axis",
        degrees: &["I", "V", "vi", "IV"],
        difficulty: Difficulty::Beginner,
        category: Category::Pop,
        mode: Mode::Major,
        tempo: 100,
        description: "The four chords behind countless pop hits.",
    },
    SeedProgression {
        name: "Fifties Doo-Wop",
        degrees: &["I", "vi", "IV", "V"],
        difficulty: Difficulty::Beginner,
        category: Category::Pop,
        mode: Mode::Major,
        tempo: 96,
        description: "Classic 1950s ballad loop.",
    },
    SeedProgression {
        name: "Three-Chord Song",
        degrees: &["I", "IV", "V", "I"],
        difficulty: Difficulty::Beginner,
        category: Category::Folk,
        mode: Mode::Major,
        tempo: 110,
        description: "Tonic, subdominant, dominant and home.",
    },
    SeedProgression {
        name: "Minor Rock Loop",
        degrees: &["i", "VI", "III", "VII"],
        difficulty: Difficulty::Beginner,
        category: Category::Rock,
        mode: Mode::Minor,
        tempo: 120,
        description: "Driving minor-key loop built on the natural minor scale.",
    },
    SeedProgression {
        name: "Major ii-V-I",
        degrees: &["ii7", "V7", "Imaj7"],
        difficulty: Difficulty::Intermediate,
        category: Category::Jazz,
        mode: Mode::Major,
        tempo: 120,
        description: "The fundamental jazz cadence with seventh chords.",
    },
    SeedProgression {
        name: "Jazz Turnaround",
        degrees: &["Imaj7", "vi7", "ii7", "V7"],
        difficulty: Difficulty::Intermediate,
        category: Category::Jazz,
        mode: Mode::Major,
        tempo: 132,
        description: "Cycles back to the tonic at the end of a chorus.",
    },
    SeedProgression {
        name: "Twelve-Bar Blues",
        degrees: &[
            "I7", "I7", "I7", "I7", "IV7", "IV7", "I7", "I7", "V7", "IV7", "I7", "V7",
        ],
        difficulty: Difficulty::Intermediate,
        category: Category::Blues,
        mode: Mode::Major,
        tempo: 110,
        description: "Standard twelve-bar form with dominant sevenths.",
    },
    SeedProgression {
        name: "Andalusian Cadence",
        degrees: &["i", "VII", "VI", "V"],
        difficulty: Difficulty::Intermediate,
        category: Category::Classical,
        mode: Mode::Minor,
        tempo: 90,
        description: "Descending minor tetrachord ending on a major dominant.",
    },
    SeedProgression {
        name: "Pachelbel Canon",
        degrees: &["I", "V", "vi", "iii", "IV", "I", "IV", "V"],
        difficulty: Difficulty::Intermediate,
        category: Category::Classical,
        mode: Mode::Major,
        tempo: 80,
        description: "Eight-chord ground bass progression.",
    },
    SeedProgression {
        name: "Mixolydian Vamp",
        degrees: &["I", "bVII", "IV", "I"],
        difficulty: Difficulty::Intermediate,
        category: Category::Rock,
        mode: Mode::Major,
        tempo: 116,
        description: "Borrowed flat-seven chord common in classic rock.",
    },
    SeedProgression {
        name: "Minor ii-V-i",
        degrees: &["iiø7", "V7", "i"],
        difficulty: Difficulty::Advanced,
        category: Category::Jazz,
        mode: Mode::Minor,
        tempo: 126,
        description: "Half-diminished approach to a minor tonic.",
    },
    SeedProgression {
        name: "Backdoor Cadence",
        degrees: &["IVmaj7", "iv7", "bVII7", "Imaj7"],
        difficulty: Difficulty::Advanced,
        category: Category::Jazz,
        mode: Mode::Major,
        tempo: 112,
        description: "Resolves to the tonic through borrowed minor-key chords.",
    },
];

/// Insert [`DEFAULT_PROGRESSIONS`] when the catalog is empty
///
/// Returns the number of rows inserted.
pub async fn seed_chord_progressions(pool: &SqlitePool) -> Result<usize> {
    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM chord_progressions")
        .fetch_one(pool)
        .await?;
    if existing > 0 {
        return Ok(0);
    }

    let now = time::now();
    let mut tx = pool.begin().await?;
    for seed in DEFAULT_PROGRESSIONS {
        let degrees = serde_json::to_string(seed.degrees)
            .map_err(|e| crate::Error::Internal(format!("Encode degrees failed: {}", e)))?;
        sqlx::query(
            r#"
            INSERT OR IGNORE INTO chord_progressions
                (id, name, degrees, difficulty, category, mode, tempo, description, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(uuid_utils::new_id())
        .bind(seed.name)
        .bind(degrees)
        .bind(seed.difficulty)
        .bind(seed.category)
        .bind(seed.mode)
        .bind(seed.tempo)
        .bind(seed.description)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    info!("Seeded {} default chord progressions", DEFAULT_PROGRESSIONS.len());
    Ok(DEFAULT_PROGRESSIONS.len())
}
