table! {
    follows (id) {
        id -> Int4,
        user_id -> Int4,
        author_id -> Int4,
    }
}

table! {
    users (id) {
        id -> Int4,
        username -> Varchar,
        email -> Varchar,
        first_name -> Nullable<Varchar>,
        last_name -> Nullable<Varchar>,
        role -> Text,
        password -> Varchar,
        is_staff -> Bool,
        is_superuser -> Bool,
        date_joined -> Timestamp,
    }
}

allow_tables_to_appear_in_same_query!(follows, users);
