use std::path::PathBuf;

use actix_files::Files;
use actix_web::{middleware::from_fn, web};

use crate::auth::page_guard;

/// Serves the exported admin dashboard from `<static_dir>/admin` behind the page guard.
pub fn configure(static_dir: PathBuf) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.service(
            web::scope("/admin")
                .wrap(from_fn(page_guard))
                .service(
                    Files::new("", static_dir.join("admin"))
                        .index_file("index.html")
                        .prefer_utf8(true),
                ),
        );
    }
}
