use crate::error::{Capability, GlueError};
use crate::module::ModuleSurface;
use crate::resource::mount_path;
use crate::ticket::LoadTicket;
use futures::future::LocalBoxFuture;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    /// Empty unless the status is a success
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait HttpClient {
    /// GETs `url`. Transport failures are `GlueError::Transport`; any HTTP
    /// status, including errors, comes back as a response.
    fn get<'a>(&'a self, url: &'a str) -> LocalBoxFuture<'a, Result<HttpResponse, GlueError>>;
}

/// Copies ROM images from the network into the module's filesystem
pub struct RomMounter<'a, S, H> {
    surface: &'a S,
    http: &'a H,
    mount_dir: &'a str,
    ticket: Option<&'a LoadTicket>,
}

impl<'a, S: ModuleSurface, H: HttpClient> RomMounter<'a, S, H> {
    pub fn new(surface: &'a S, http: &'a H, mount_dir: &'a str) -> Self {
        Self {
            surface,
            http,
            mount_dir,
            ticket: None,
        }
    }

    /// Abandons the mount, before anything is written, once `ticket` is superseded
    pub fn guarded_by(mut self, ticket: &'a LoadTicket) -> Self {
        self.ticket = Some(ticket);
        self
    }

    /// Fetches `url` and stores it as `filename`, returning the name used
    pub async fn mount(&self, url: &str, filename: &str) -> Result<String, GlueError> {
        let bytes = self.fetch(url).await?;
        if let Some(ticket) = self.ticket {
            ticket.check()?;
        }
        self.inject(filename, &bytes)?;
        Ok(filename.to_owned())
    }

    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, GlueError> {
        let response = self.http.get(url).await?;
        if !response.is_success() {
            return Err(GlueError::Fetch {
                url: url.to_owned(),
                status: response.status,
            });
        }
        log::info!("fetched {url} ({} bytes)", response.body.len());
        Ok(response.body)
    }

    /// Writes `bytes` to `<mount_dir>/<filename>`, replacing any earlier file
    pub fn inject(&self, filename: &str, bytes: &[u8]) -> Result<(), GlueError> {
        if !self.surface.has_create_data_file() {
            return Err(GlueError::CapabilityMissing(Capability::Filesystem));
        }

        let path = mount_path(self.mount_dir, filename);
        if let Err(e) = self.surface.unlink(&path) {
            // usually just "no such file"
            log::debug!("unlink {path}: {e}");
        }

        self.surface
            .create_data_file(self.mount_dir, filename, bytes, true, true)
            .map_err(|message| GlueError::Filesystem {
                path: path.clone(),
                message,
            })?;
        log::info!("mounted {path}");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FakeHttp, FakeModule};
    use crate::ticket::LoadTickets;
    use futures::executor::block_on;

    const ROM: &[u8] = &[0x80, 0x37, 0x12, 0x40, 0xde, 0xad];

    #[test]
    fn mount_writes_payload_once_under_filename() {
        let module = FakeModule::new();
        let http = FakeHttp::new().serve("roms/game.z64", ROM);
        let mounter = RomMounter::new(&module, &http, "/");

        let name = block_on(mounter.mount("roms/game.z64", "game.z64")).unwrap();
        assert_eq!(name, "game.z64");

        let created = module.created();
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].parent, "/");
        assert_eq!(created[0].name, "game.z64");
        assert_eq!(created[0].data, ROM);
        assert!(created[0].can_read && created[0].can_write);
    }

    #[test]
    fn prior_file_is_unlinked_and_failure_ignored() {
        let module = FakeModule::new();
        let http = FakeHttp::new().serve("game.z64", ROM);
        let mounter = RomMounter::new(&module, &http, "/");

        block_on(mounter.mount("game.z64", "game.z64")).unwrap();
        assert_eq!(module.unlinked(), vec!["/game.z64"]);
        assert_eq!(module.created().len(), 1);
    }

    #[test]
    fn http_error_never_touches_filesystem() {
        let module = FakeModule::new();
        let http = FakeHttp::new().respond("roms/missing.z64", 404, b"not found");
        let mounter = RomMounter::new(&module, &http, "/");

        let err = block_on(mounter.mount("roms/missing.z64", "missing.z64")).unwrap_err();
        assert_eq!(
            err,
            GlueError::Fetch {
                url: "roms/missing.z64".into(),
                status: 404
            }
        );
        assert!(module.created().is_empty());
        assert!(module.unlinked().is_empty());
    }

    #[test]
    fn superseded_load_fetches_but_never_writes() {
        let module = FakeModule::new();
        let http = FakeHttp::new().serve("game.z64", ROM);
        let tickets = LoadTickets::new();
        let stale = tickets.issue();
        let _newer = tickets.issue();
        let mounter = RomMounter::new(&module, &http, "/").guarded_by(&stale);

        let err = block_on(mounter.mount("game.z64", "game.z64")).unwrap_err();
        assert_eq!(err, GlueError::Cancelled);
        assert_eq!(http.requests(), vec!["game.z64"]);
        assert!(module.created().is_empty());
        assert!(module.unlinked().is_empty());
    }

    #[test]
    fn transport_error_passes_through() {
        let module = FakeModule::new();
        let http = FakeHttp::new().refuse("game.z64", "NetworkError");
        let mounter = RomMounter::new(&module, &http, "/");

        let err = block_on(mounter.mount("game.z64", "game.z64")).unwrap_err();
        assert!(matches!(err, GlueError::Transport { .. }));
    }

    #[test]
    fn missing_create_primitive_is_capability_error() {
        let module = FakeModule::new().without_filesystem();
        let http = FakeHttp::new().serve("game.z64", ROM);
        let mounter = RomMounter::new(&module, &http, "/");

        let err = block_on(mounter.mount("game.z64", "game.z64")).unwrap_err();
        assert_eq!(err, GlueError::CapabilityMissing(Capability::Filesystem));
        assert!(module.unlinked().is_empty());
    }

    #[test]
    fn create_failure_names_the_path() {
        let module = FakeModule::new().with_failing_create();
        let http = FakeHttp::new();
        let mounter = RomMounter::new(&module, &http, "/roms");

        let err = mounter.inject("game.z64", ROM).unwrap_err();
        assert_eq!(
            err,
            GlueError::Filesystem {
                path: "/roms/game.z64".into(),
                message: "ENOSPC".into()
            }
        );
    }
}
