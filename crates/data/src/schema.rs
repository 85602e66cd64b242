diesel::table! {
    users (id) {
        id -> Int8,
        server_id -> Text,
        user_id -> Text,
        display_name -> Nullable<Text>,
        is_admin -> Bool,
        password_pattern -> Nullable<Text>,
        created_at -> Int8,
    }
}

diesel::table! {
    tokens (id) {
        id -> Int8,
        server_id -> Text,
        user_id -> Int8,
        access_token -> Text,
        refresh_token -> Text,
        expires_in_ms -> Nullable<Int8>,
        created_at -> Int8,
    }
}

diesel::table! {
    passwords (id) {
        id -> Int8,
        server_id -> Text,
        user_id -> Int8,
        password -> Text,
        created_at -> Int8,
    }
}

diesel::table! {
    rooms (id) {
        id -> Int8,
        server_id -> Text,
        room_id -> Text,
        name -> Nullable<Text>,
        topic -> Nullable<Text>,
        creator -> Nullable<Text>,
        created_at -> Int8,
    }
}

diesel::table! {
    room_members (id) {
        id -> Int8,
        server_id -> Text,
        room_id -> Int8,
        user_id -> Int8,
        accepted -> Bool,
        banned -> Bool,
        state -> Nullable<Text>,
        created_at -> Int8,
    }
}

diesel::table! {
    medias (id) {
        id -> Int8,
        server_id -> Text,
        user_id -> Nullable<Int8>,
        media_id -> Text,
        content_type -> Nullable<Text>,
        file_size -> Int8,
        created_at -> Int8,
    }
}

diesel::table! {
    threepids (id) {
        id -> Int8,
        server_id -> Text,
        user_id -> Int8,
        medium -> Text,
        address -> Text,
        validated_at -> Nullable<Int8>,
        created_at -> Int8,
    }
}

diesel::table! {
    externalids (id) {
        id -> Int8,
        server_id -> Text,
        user_id -> Int8,
        auth_provider -> Text,
        external_id -> Text,
        created_at -> Int8,
    }
}

diesel::joinable!(tokens -> users (user_id));
diesel::joinable!(passwords -> users (user_id));
diesel::joinable!(room_members -> rooms (room_id));
diesel::joinable!(room_members -> users (user_id));
diesel::joinable!(threepids -> users (user_id));
diesel::joinable!(externalids -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    tokens,
    passwords,
    rooms,
    room_members,
    medias,
    threepids,
    externalids,
);
