pub const TICKET_TABLES_SQL: &str = r#"
    CREATE TABLE IF NOT EXISTS support_tickets (
        id BIGSERIAL PRIMARY KEY,
        name TEXT NOT NULL DEFAULT '',
        email TEXT NOT NULL DEFAULT '',
        phone TEXT NOT NULL DEFAULT '',
        error_description TEXT NOT NULL DEFAULT '',
        image_url TEXT,
        images JSONB,
        is_read BOOLEAN NOT NULL DEFAULT FALSE,
        status VARCHAR(32) NOT NULL DEFAULT 'new'
            CHECK (status IN ('new', 'inProgress', 'completed')),
        assigned_to TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );

    CREATE INDEX IF NOT EXISTS idx_support_tickets_created_at
        ON support_tickets (created_at DESC);

    CREATE TABLE IF NOT EXISTS ticket_comments (
        id BIGSERIAL PRIMARY KEY,
        ticket_id BIGINT NOT NULL REFERENCES support_tickets(id) ON DELETE CASCADE,
        text TEXT NOT NULL,
        author TEXT NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    );

    CREATE INDEX IF NOT EXISTS idx_ticket_comments_thread
        ON ticket_comments (ticket_id, created_at);
"#;
