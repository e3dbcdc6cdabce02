pub mod session_authority;
