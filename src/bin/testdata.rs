use chrono::Utc;
use clap::Parser;
use diesel::{Connection, prelude::*};
use diesel_migrations::MigrationHarness;
use uuid::Uuid;

use marquee::MIGRATIONS;
use marquee::schema::{categories, nominees, users};

#[derive(Parser)]
pub struct Seed {
    database_url: Option<String>,
    /// Also create a handful of demo users.
    #[clap(long, action)]
    demo_users: bool,
}

type CategorySeed = (&'static str, &'static [(&'static str, Option<&'static str>)]);

const CATEGORY_SEED: &[CategorySeed] = &[
    (
        "Best Picture",
        &[
            ("Anora", None),
            ("The Brutalist", None),
            ("Conclave", None),
            ("Wicked", None),
            ("A Complete Unknown", None),
        ],
    ),
    (
        "Best Director",
        &[
            ("Sean Baker", Some("Anora")),
            ("Brady Corbet", Some("The Brutalist")),
            ("Jacques Audiard", Some("Emilia Pérez")),
        ],
    ),
    (
        "Best Actor",
        &[
            ("Adrien Brody", Some("The Brutalist")),
            ("Timothée Chalamet", Some("A Complete Unknown")),
            ("Ralph Fiennes", Some("Conclave")),
        ],
    ),
    (
        "Best Actress",
        &[
            ("Mikey Madison", Some("Anora")),
            ("Demi Moore", Some("The Substance")),
            ("Fernanda Torres", Some("I'm Still Here")),
        ],
    ),
    (
        "Best Supporting Actor",
        &[
            ("Kieran Culkin", Some("A Real Pain")),
            ("Edward Norton", Some("A Complete Unknown")),
            ("Guy Pearce", Some("The Brutalist")),
        ],
    ),
    (
        "Best Supporting Actress",
        &[
            ("Zoe Saldaña", Some("Emilia Pérez")),
            ("Ariana Grande", Some("Wicked")),
            ("Isabella Rossellini", Some("Conclave")),
        ],
    ),
    (
        "Best Original Screenplay",
        &[
            ("Anora", None),
            ("The Brutalist", None),
            ("A Real Pain", None),
        ],
    ),
    (
        "Best Adapted Screenplay",
        &[
            ("Conclave", None),
            ("A Complete Unknown", None),
            ("Nickel Boys", None),
        ],
    ),
    (
        "Best Animated Feature",
        &[
            ("Flow", None),
            ("Inside Out 2", None),
            ("The Wild Robot", None),
        ],
    ),
    (
        "Best International Feature",
        &[
            ("I'm Still Here", None),
            ("Emilia Pérez", None),
            ("The Seed of the Sacred Fig", None),
        ],
    ),
    (
        "Best Documentary Feature",
        &[
            ("No Other Land", None),
            ("Porcelain War", None),
            ("Sugarcane", None),
        ],
    ),
    (
        "Best Original Score",
        &[
            ("The Brutalist", None),
            ("Conclave", None),
            ("Wicked", None),
        ],
    ),
    (
        "Best Original Song",
        &[
            ("El Mal", Some("Emilia Pérez")),
            ("Like a Bird", Some("Sing Sing")),
            ("The Journey", Some("The Six Triple Eight")),
        ],
    ),
    (
        "Best Sound",
        &[
            ("Dune: Part Two", None),
            ("A Complete Unknown", None),
            ("Wicked", None),
        ],
    ),
    (
        "Best Production Design",
        &[
            ("The Brutalist", None),
            ("Conclave", None),
            ("Wicked", None),
        ],
    ),
    (
        "Best Cinematography",
        &[
            ("The Brutalist", None),
            ("Dune: Part Two", None),
            ("Nosferatu", None),
        ],
    ),
    (
        "Best Makeup and Hairstyling",
        &[
            ("The Substance", None),
            ("Nosferatu", None),
            ("Wicked", None),
        ],
    ),
    (
        "Best Costume Design",
        &[
            ("Wicked", None),
            ("Nosferatu", None),
            ("Conclave", None),
        ],
    ),
    (
        "Best Film Editing",
        &[
            ("Anora", None),
            ("The Brutalist", None),
            ("Conclave", None),
        ],
    ),
    (
        "Best Visual Effects",
        &[
            ("Dune: Part Two", None),
            ("Wicked", None),
            ("Better Man", None),
        ],
    ),
    (
        "Best Animated Short",
        &[
            ("In the Shadow of the Cypress", None),
            ("Magic Candies", None),
            ("Yuck!", None),
        ],
    ),
    (
        "Best Live Action Short",
        &[
            ("I'm Not a Robot", None),
            ("A Lien", None),
            ("The Last Ranger", None),
        ],
    ),
    (
        "Best Documentary Short",
        &[
            ("The Only Girl in the Orchestra", None),
            ("Incident", None),
            ("Instruments of a Beating Heart", None),
        ],
    ),
    (
        "Best Casting",
        &[
            ("Anora", None),
            ("Conclave", None),
            ("Wicked", None),
        ],
    ),
];

const DEMO_USERS: &[(&str, &str)] = &[
    ("Ana", "ana@example.com"),
    ("Bruno", "bruno@example.com"),
    ("Carla", "carla@example.com"),
    ("Diego", "diego@example.com"),
];

fn main() {
    let args = Seed::parse();
    let db_url = if let Some(url) = args.database_url {
        url
    } else {
        std::env::var("DATABASE_URL").expect(
            "please either set `DATABASE_URL` or pass the `--database-url` flag",
        )
    };

    let mut conn = diesel::SqliteConnection::establish(&db_url).unwrap();

    conn.run_pending_migrations(MIGRATIONS).unwrap();

    if categories::table
        .count()
        .get_result::<i64>(&mut conn)
        .unwrap()
        > 0
    {
        panic!("categories already seeded!");
    }

    let now = Utc::now().naive_utc();

    for (i, (category_name, category_nominees)) in
        CATEGORY_SEED.iter().enumerate()
    {
        let category_id = Uuid::now_v7().to_string();

        diesel::insert_into(categories::table)
            .values((
                categories::id.eq(&category_id),
                categories::name.eq(category_name),
                categories::display_order.eq(i as i64 + 1),
                categories::created_at.eq(now),
            ))
            .execute(&mut conn)
            .unwrap();

        for (nominee_name, movie) in category_nominees.iter() {
            diesel::insert_into(nominees::table)
                .values((
                    nominees::id.eq(Uuid::now_v7().to_string()),
                    nominees::category_id.eq(&category_id),
                    nominees::name.eq(nominee_name),
                    nominees::movie.eq(movie.map(str::to_string)),
                    nominees::is_winner.eq(false),
                    nominees::created_at.eq(now),
                ))
                .execute(&mut conn)
                .unwrap();
        }
    }

    println!("seeded {} categories", CATEGORY_SEED.len());

    if args.demo_users {
        for (name, email) in DEMO_USERS {
            diesel::insert_into(users::table)
                .values((
                    users::id.eq(Uuid::now_v7().to_string()),
                    users::name.eq(name),
                    users::email.eq(email),
                    users::city.eq(None::<String>),
                    users::state.eq(None::<String>),
                    users::created_at.eq(now),
                    users::updated_at.eq(now),
                ))
                .execute(&mut conn)
                .unwrap();
        }

        println!("seeded {} demo users", DEMO_USERS.len());
    }
}
