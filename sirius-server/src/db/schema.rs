/// SQL schema for the SIRIUS database
/// Creates all tables with proper constraints, foreign keys, and indexes
pub const SCHEMA: &str = r#"
-- Identity provider side: credentials only
CREATE TABLE IF NOT EXISTS accounts (
    id TEXT PRIMARY KEY,
    email TEXT UNIQUE NOT NULL,
    password_hash TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Public profile projection. A row may be missing for a valid account;
-- profile resolution falls back to the accounts table and writes back.
CREATE TABLE IF NOT EXISTS users (
    id TEXT PRIMARY KEY,
    full_name TEXT,
    career TEXT,
    email TEXT,
    FOREIGN KEY (id) REFERENCES accounts(id) ON DELETE CASCADE
);

-- Posts table. likes_count/comments_count are denormalized caches:
-- refreshed after mutations, never trusted when rendering the feed.
CREATE TABLE IF NOT EXISTS posts (
    id TEXT PRIMARY KEY,
    author_id TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL,
    likes_count INTEGER NOT NULL DEFAULT 0,
    comments_count INTEGER NOT NULL DEFAULT 0,
    FOREIGN KEY (author_id) REFERENCES accounts(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_posts_author_id ON posts(author_id);

-- Media attachments, created only alongside a post
CREATE TABLE IF NOT EXISTS post_media (
    id TEXT PRIMARY KEY,
    post_id TEXT NOT NULL,
    storage_path TEXT NOT NULL,
    url TEXT NOT NULL,
    mime_type TEXT NOT NULL,
    size_bytes INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_post_media_post_id ON post_media(post_id);

-- Likes: existence-only join rows, one per (post, user)
CREATE TABLE IF NOT EXISTS post_likes (
    post_id TEXT NOT NULL,
    user_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    PRIMARY KEY (post_id, user_id),
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
    FOREIGN KEY (user_id) REFERENCES accounts(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_post_likes_user_id ON post_likes(user_id);

-- Comments
CREATE TABLE IF NOT EXISTS post_comments (
    id TEXT PRIMARY KEY,
    post_id TEXT NOT NULL,
    author_id TEXT NOT NULL,
    content TEXT NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
    FOREIGN KEY (author_id) REFERENCES accounts(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_post_comments_post_id ON post_comments(post_id);
CREATE INDEX IF NOT EXISTS idx_post_comments_created_at ON post_comments(created_at DESC);

-- Sessions for bearer-token authentication
CREATE TABLE IF NOT EXISTS sessions (
    token TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    created_at TEXT NOT NULL,
    expires_at TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES accounts(id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);
CREATE INDEX IF NOT EXISTS idx_sessions_expires_at ON sessions(expires_at);

-- Campus service directory
CREATE TABLE IF NOT EXISTS services (
    id TEXT PRIMARY KEY,
    category TEXT NOT NULL,
    name TEXT NOT NULL,
    url TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT ''
);
"#;

/// Seed rows for the campus service directory. Safe to run repeatedly.
pub const SERVICE_SEED: &str = r#"
INSERT OR IGNORE INTO services (id, category, name, url, description) VALUES
    ('6f1b2a30-0000-4000-8000-000000000001', 'Information systems', 'Mi Portal U', 'https://miportalu.unab.edu.co/', 'Main student portal'),
    ('6f1b2a30-0000-4000-8000-000000000002', 'Information systems', 'Cosmos', 'https://cosmos.unab.edu.co/', 'Academic management system'),
    ('6f1b2a30-0000-4000-8000-000000000003', 'Information systems', 'University Mail', 'https://mail.google.com/a/unab.edu.co', 'Institutional email'),
    ('6f1b2a30-0000-4000-8000-000000000004', 'Information systems', 'Office 365', 'http://portal.office.com/', 'Microsoft Office suite'),
    ('6f1b2a30-0000-4000-8000-000000000005', 'Digital services', 'Library', 'https://unab.edu.co/sistema-de-bibliotecas-unab/', 'University library system'),
    ('6f1b2a30-0000-4000-8000-000000000006', 'Digital services', 'Student Wellbeing', 'https://bienestar.unab.edu.co/', 'Campus wellbeing services'),
    ('6f1b2a30-0000-4000-8000-000000000007', 'Digital services', 'Paperwork', 'https://unab.edu.co/estudiantes/#tramites', 'Student paperwork management'),
    ('6f1b2a30-0000-4000-8000-000000000008', 'Digital services', 'Password Recovery', 'https://correo.unab.edu.co/recuperarClave.jsp', 'University account password recovery'),
    ('6f1b2a30-0000-4000-8000-000000000009', 'Learning platforms', 'Canvas', 'https://canvas.unab.edu.co/', 'Virtual learning platform'),
    ('6f1b2a30-0000-4000-8000-00000000000a', 'Learning platforms', 'Teams', 'https://www.microsoft.com/microsoft-365/microsoft-teams/group-chat-software', 'Collaboration and video calls'),
    ('6f1b2a30-0000-4000-8000-00000000000b', 'Learning platforms', 'TEMA', 'https://tema.unab.edu.co/', 'TEMA undergraduate platform');
"#;
