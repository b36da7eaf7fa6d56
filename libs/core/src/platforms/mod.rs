pub mod whatsapp;
