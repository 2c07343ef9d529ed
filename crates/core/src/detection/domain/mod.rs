pub mod face_observer;
