pub mod supabase_user_profile_repository;
