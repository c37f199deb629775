pub mod fixture_face_source;
