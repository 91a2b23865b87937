pub mod memory;
pub mod store;
pub mod supabase;

pub use memory::{InMemoryAccountStore, InMemoryConsultationStore};
pub use store::{AccountStore, ConsultationStore, StoreError};
pub use supabase::{SupabaseAccountStore, SupabaseClient, SupabaseConsultationStore};
