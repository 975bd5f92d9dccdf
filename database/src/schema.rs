//! Table definitions, applied idempotently on startup.

pub const CATALOG: &[&str] = &["Guitar", "Bass", "Drums", "Vocals", "Keyboard"];

pub(crate) const CREATE_TABLES: &str = r#"
DO $$ BEGIN
    CREATE TYPE song_status AS ENUM ('PRACTICING', 'ARCHIVED');
EXCEPTION
    WHEN duplicate_object THEN NULL;
END $$;

CREATE TABLE IF NOT EXISTS users (
    id SERIAL PRIMARY KEY,
    username TEXT NOT NULL,
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE TABLE IF NOT EXISTS songs (
    id SERIAL PRIMARY KEY,
    title TEXT NOT NULL,
    artist TEXT NOT NULL,
    youtube_url TEXT,
    user_id INTEGER NOT NULL REFERENCES users(id),
    status song_status NOT NULL DEFAULT 'PRACTICING',
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);

CREATE INDEX IF NOT EXISTS idx_songs_status_created_at ON songs(status, created_at DESC);

CREATE TABLE IF NOT EXISTS defined_instruments (
    id SERIAL PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS song_instruments (
    id SERIAL PRIMARY KEY,
    song_id INTEGER NOT NULL REFERENCES songs(id),
    instrument_id INTEGER NOT NULL REFERENCES defined_instruments(id),
    progress INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_song_instruments_song_id ON song_instruments(song_id);
"#;

pub(crate) const SEED_CATALOG: &str = "
    insert into defined_instruments(name)
    select unnest($1::text[])
    on conflict (name) do nothing
";
