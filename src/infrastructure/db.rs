use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, Statement};

pub async fn init_db(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let db = Database::connect(database_url).await?;

    // Run migrations manually (simple SQL)
    run_migrations(&db).await?;

    Ok(db)
}

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS department (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS employee (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        username TEXT NOT NULL UNIQUE,
        password_hash TEXT NOT NULL,
        first_name TEXT NOT NULL DEFAULT '',
        last_name TEXT NOT NULL DEFAULT '',
        email TEXT NOT NULL DEFAULT '',
        is_staff BOOLEAN NOT NULL DEFAULT 0,
        is_superuser BOOLEAN NOT NULL DEFAULT 0,
        is_active BOOLEAN NOT NULL DEFAULT 1,
        permissions TEXT NOT NULL DEFAULT '[]',
        department_id INTEGER,
        date_joined TEXT NOT NULL,
        FOREIGN KEY (department_id) REFERENCES department(id) ON DELETE SET NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS publisher (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        postal_code TEXT,
        prefecture TEXT,
        address_1 TEXT,
        address_2 TEXT,
        phone_number TEXT
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS author (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS book (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        title TEXT NOT NULL,
        image TEXT,
        publisher_id INTEGER,
        price INTEGER CHECK (price IS NULL OR price >= 0),
        size TEXT,
        description TEXT,
        publish_date TEXT,
        created_by_id INTEGER,
        created_at TEXT NOT NULL,
        FOREIGN KEY (publisher_id) REFERENCES publisher(id) ON DELETE RESTRICT,
        FOREIGN KEY (created_by_id) REFERENCES employee(id) ON DELETE SET NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS book_authors (
        book_id INTEGER NOT NULL,
        author_id INTEGER NOT NULL,
        PRIMARY KEY (book_id, author_id),
        FOREIGN KEY (book_id) REFERENCES book(id) ON DELETE CASCADE,
        FOREIGN KEY (author_id) REFERENCES author(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS stock (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        book_id INTEGER NOT NULL UNIQUE,
        quantity INTEGER NOT NULL DEFAULT 0,
        FOREIGN KEY (book_id) REFERENCES book(id) ON DELETE CASCADE
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS address (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        local_government_code INTEGER NOT NULL,
        postal_code_old TEXT NOT NULL,
        postal_code TEXT NOT NULL,
        prefecture_kana TEXT NOT NULL,
        city_kana TEXT NOT NULL,
        section_kana TEXT,
        prefecture TEXT NOT NULL,
        city TEXT NOT NULL,
        section TEXT,
        has_multiple_postal_codes INTEGER NOT NULL,
        has_banchi INTEGER NOT NULL,
        has_chome INTEGER NOT NULL,
        has_multiple_sections INTEGER NOT NULL,
        update_status INTEGER NOT NULL,
        update_reason INTEGER NOT NULL
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_address_postal_code ON address (postal_code)",
    "CREATE INDEX IF NOT EXISTS idx_book_publish_date ON book (publish_date)",
];

async fn run_migrations(db: &DatabaseConnection) -> Result<(), DbErr> {
    for sql in SCHEMA {
        db.execute(Statement::from_string(
            db.get_database_backend(),
            sql.to_string(),
        ))
        .await?;
    }

    tracing::debug!("Schema ready ({} statements)", SCHEMA.len());
    Ok(())
}
