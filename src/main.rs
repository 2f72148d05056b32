use anyhow::{bail, Context, Error};
use clap::Parser;
use clap_stdin::MaybeStdin;
use mdoc_verifier::definitions::{
    DeviceRequest, DocumentCatalog, EngagementCode, Mode, RequestedDocument,
};
use mdoc_verifier::presentation::{search, select_option};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    action: Action,
}

#[derive(Debug, clap::Subcommand)]
enum Action {
    /// Print the document types, namespaces, modes and claims the verifier can request.
    Catalog,
    /// Search the catalog by document or mode name.
    Search { query: String },
    /// Check that a scanned code is a proximity engagement code.
    CheckEngagement {
        /// Contents of the scanned QR code.
        code: MaybeStdin<String>,
    },
    /// Print the base64 encoded CBOR request for full selections of the given options.
    Request {
        /// Catalog option ids, e.g. `org.iso.18013.5.1.mDL`.
        #[arg(required = true)]
        options: Vec<String>,
        /// Ask the holder for permission to retain the data.
        #[arg(long)]
        retain: bool,
    },
}

fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let catalog = DocumentCatalog::standard();
    match Args::parse().action {
        Action::Catalog => print_catalog(&catalog),
        Action::Search { query } => {
            let found = search(&query, &catalog.options());
            println!("{}", serde_json::to_string_pretty(&found)?);
            Ok(())
        }
        Action::CheckEngagement { code } => {
            let code =
                EngagementCode::parse(&code.to_string()).context("invalid engagement code")?;
            println!("{}", code.payload());
            Ok(())
        }
        Action::Request { options, retain } => print_request(&catalog, &options, retain),
    }
}

fn print_catalog(catalog: &DocumentCatalog) -> Result<(), Error> {
    let entries = catalog
        .entries()
        .iter()
        .map(|(document_type, entry)| {
            serde_json::json!({
                "documentType": document_type,
                "docType": document_type.doc_type(),
                "namespace": document_type.namespace(),
                "modes": entry.modes,
                "claims": entry.claims,
            })
        })
        .collect::<Vec<_>>();
    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}

fn print_request(catalog: &DocumentCatalog, ids: &[String], retain: bool) -> Result<(), Error> {
    let options = catalog.options();
    let mut documents: Vec<RequestedDocument> = Vec::new();
    for id in ids {
        let Some(option) = options.iter().find(|o| &o.id == id) else {
            bail!("unknown catalog option: {id}")
        };
        documents = select_option(
            catalog,
            &documents,
            &option.id,
            option.document_type,
            Mode::Full,
        )
        .documents()
        .to_vec();
    }
    let request =
        DeviceRequest::from_requested(&documents, retain).context("nothing to request")?;
    println!("{}", base64::encode(request.to_cbor()?));
    Ok(())
}
