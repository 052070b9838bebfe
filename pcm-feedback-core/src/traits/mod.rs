pub mod pcm_backend;
pub mod session_observer;
