pub mod scripted_face_observer;
