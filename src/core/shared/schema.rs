diesel::table! {
    support_tickets (id) {
        id -> Int8,
        name -> Text,
        email -> Text,
        phone -> Text,
        error_description -> Text,
        image_url -> Nullable<Text>,
        images -> Nullable<Jsonb>,
        is_read -> Bool,
        status -> Varchar,
        assigned_to -> Nullable<Text>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    ticket_comments (id) {
        id -> Int8,
        ticket_id -> Int8,
        text -> Text,
        author -> Text,
        created_at -> Timestamptz,
    }
}

diesel::joinable!(ticket_comments -> support_tickets (ticket_id));

diesel::allow_tables_to_appear_in_same_query!(support_tickets, ticket_comments);
