pub mod memory;
pub mod store;
pub mod supabase;

pub use memory::InMemoryStore;
pub use store::{decode, decode_all, encode, Collection, Filter, RecordStore, StoreError, ID_FIELD};
pub use supabase::{SupabaseClient, SupabaseStore};
