//! Esquema Diesel, escrito a mano a partir de `migrations/`.

diesel::table! {
    actors (id) {
        id -> Text,
        name -> Text,
        module_name -> Text,
        icon -> Nullable<Text>,
        actor_type -> Text,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    actor_instances (id) {
        id -> Text,
        workspace_id -> Text,
        actor_id -> Text,
        name -> Text,
        configuration -> Jsonb,
        actor_type -> Text,
        user_id -> Nullable<Text>,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    connections (id) {
        id -> Text,
        workspace_id -> Text,
        source_instance_id -> Text,
        generator_instance_id -> Text,
        destination_instance_id -> Text,
        name -> Text,
        namespace_format -> Text,
        prefix -> Nullable<Text>,
        configuration -> Nullable<Jsonb>,
        catalog -> Nullable<Jsonb>,
        schedule -> Nullable<Jsonb>,
        schedule_type -> Text,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    connection_run_logs (id) {
        id -> Text,
        connection_id -> Text,
        run_id -> Text,
        message_type -> Text,
        message -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::joinable!(actor_instances -> actors (actor_id));
diesel::joinable!(connection_run_logs -> connections (connection_id));

diesel::allow_tables_to_appear_in_same_query!(actors, actor_instances, connections, connection_run_logs,);
