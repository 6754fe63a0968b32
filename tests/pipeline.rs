use taxocorpus::category::{Blacklist, BlacklistRules, CategoryTree};
use taxocorpus::content::Corpus;
use taxocorpus::pipeline::{ContentOutcome, Pipeline, PipelineConfig, Stage};
use taxocorpus::source::{MemberKind, MemorySource};
use taxocorpus::storage::ArtifactKind;
use tempfile::TempDir;

fn codes_source() -> MemorySource {
    MemorySource::new()
        .with_subcategories(
            "Códigos jurídicos",
            ["Sharia", "Códigos por país", "Código Civil"],
        )
        .with_subcategories("Sharia", ["Fiqh"])
        .with_subcategories("Códigos por país", ["Códigos de España"])
        .with_pages("Códigos jurídicos", ["Código (derecho)"])
        .with_pages("Código Civil", ["Código civil de Chile", "Código (derecho)"])
        .with_pages("Sharia", ["Hadd"])
        .with_html(
            "Código (derecho)",
            r#"<p>Un código es un conjunto de normas.</p>
               <h2><span class="mw-headline" id="Referencias">Referencias</span></h2>
               <ol><li>Cita</li></ol>"#,
        )
        .with_html("Código civil de Chile", "<p>Promulgado en 1855.</p>")
}

fn codes_config(dir: &TempDir) -> PipelineConfig {
    PipelineConfig::builder()
        .seeds(["Códigos jurídicos"])
        .degree(1)
        .blacklists(BlacklistRules::global(Blacklist::new(["Sharia"], ["por país"])))
        .output(dir.path())
        .prefix("test")
        .build()
}

#[tokio::test]
async fn test_codes_example_end_to_end() {
    let dir = TempDir::new().unwrap();
    let config = codes_config(&dir);
    let source = codes_source();

    let pipeline = Pipeline::new(&config, &source);
    let report = pipeline.run(Stage::Content).await.unwrap();
    let domain = report.domain("Códigos jurídicos").unwrap();

    assert_eq!(
        domain.taxonomy.categories.get("Códigos jurídicos").unwrap(),
        ["Código Civil"]
    );
    assert!(domain.partition.is_removed("Sharia"));
    assert!(domain.partition.is_removed("Códigos por país"));
    assert!(domain.partition.is_removed("Fiqh"));
    assert_eq!(domain.partition.blacklist.get("Sharia").unwrap(), ["Fiqh"]);

    // Blacklisted categories are never listed for pages.
    assert_eq!(source.calls("Sharia", MemberKind::Page), 0);

    let saved: CategoryTree = pipeline
        .storage()
        .load(ArtifactKind::Taxonomy, "Códigos jurídicos", 1)
        .await
        .unwrap();
    assert_eq!(saved, domain.taxonomy.categories);

    let corpus: Corpus = pipeline
        .storage()
        .load(ArtifactKind::Content, "Códigos jurídicos", 1)
        .await
        .unwrap();
    assert_eq!(corpus.len(), 2);
    let code = corpus.get("Código (derecho)").unwrap();
    assert_eq!(code.len(), 1);
    assert_eq!(code.blocks()[0].text, "Un código es un conjunto de normas.");

    assert_eq!(source.html_calls("Código (derecho)"), 1);
    assert!(dir.path().join("test_content_códigos_jurídicos_1.json").exists());
}

#[tokio::test]
async fn test_saved_content_is_not_fetched_again() {
    let dir = TempDir::new().unwrap();
    let config = codes_config(&dir);

    let first = codes_source();
    Pipeline::new(&config, &first)
        .run(Stage::Content)
        .await
        .unwrap();
    assert_eq!(first.total_html_calls(), 2);

    let second = codes_source();
    let report = Pipeline::new(&config, &second)
        .run(Stage::Content)
        .await
        .unwrap();

    assert_eq!(second.total_html_calls(), 0);
    assert_eq!(
        report.domain("Códigos jurídicos").unwrap().content,
        Some(ContentOutcome::AlreadySaved)
    );
}

#[tokio::test]
async fn test_cached_pages_are_reused_by_a_new_domain() {
    let dir = TempDir::new().unwrap();
    let config = codes_config(&dir);
    Pipeline::new(&config, &codes_source())
        .run(Stage::Content)
        .await
        .unwrap();

    // Another domain sharing a page with the saved corpus.
    let source = MemorySource::new()
        .with_subcategories("Derecho civil", Vec::<String>::new())
        .with_pages("Derecho civil", ["Código civil de Chile", "Contrato"])
        .with_html("Contrato", "<p>Acuerdo de voluntades.</p>");
    let config = PipelineConfig {
        seeds: vec!["Derecho civil".to_string()],
        ..codes_config(&dir)
    };

    let report = Pipeline::new(&config, &source)
        .run(Stage::Content)
        .await
        .unwrap();

    assert_eq!(source.html_calls("Código civil de Chile"), 0);
    assert_eq!(source.html_calls("Contrato"), 1);
    match &report.domain("Derecho civil").unwrap().content {
        Some(ContentOutcome::Collected(collected)) => {
            assert_eq!(collected.cached, 1);
            assert_eq!(collected.fetched, 1);
        }
        other => panic!("unexpected content outcome {:?}", other),
    }
}

#[tokio::test]
async fn test_content_file_is_never_overwritten() {
    let dir = TempDir::new().unwrap();
    let config = codes_config(&dir);
    Pipeline::new(&config, &codes_source())
        .run(Stage::Content)
        .await
        .unwrap();

    let path = dir.path().join("test_content_códigos_jurídicos_1.json");
    let before = std::fs::read_to_string(&path).unwrap();

    // Same domain, different page text: the saved file must stay as it was.
    let changed = codes_source().with_html("Código civil de Chile", "<p>Otro texto.</p>");
    let report = Pipeline::new(&config, &changed)
        .run(Stage::Content)
        .await
        .unwrap();

    assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
    assert!(!report.files.contains(&path));
}

#[tokio::test]
async fn test_partial_listing_still_builds_tree() {
    let dir = TempDir::new().unwrap();
    let subcategories: Vec<String> = (0..1000).map(|i| format!("Sub {}", i)).collect();
    let source = MemorySource::new()
        .with_subcategories("Raíz", subcategories)
        .with_page_size(500)
        .fail_after("Raíz", MemberKind::Subcategory, 1);
    let config = PipelineConfig::builder()
        .seeds(["Raíz"])
        .degree(0)
        .output(dir.path())
        .build();

    let report = Pipeline::new(&config, &source)
        .run(Stage::Categories)
        .await
        .unwrap();

    assert_eq!(report.tree.get("Raíz").unwrap().len(), 500);
    assert_eq!(report.tree.len(), 1);
    assert!(report.build.incomplete.contains_key("Raíz"));
}

#[tokio::test]
async fn test_empty_fragment_in_config_file_removes_nothing() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        format!(
            r#"{{"seeds": ["Derecho"], "degree": 1, "output": {:?},
                "blacklists": {{"*": {{"substrings": [""]}}, "Derecho": {{"substrings": [""]}}}}}}"#,
            dir.path()
        ),
    )
    .unwrap();
    let config = PipelineConfig::read_config(&path).await.unwrap();
    let source = MemorySource::new()
        .with_subcategories("Derecho", ["Derecho civil", "Derecho penal"])
        .with_subcategories("Derecho civil", ["Contratos"]);

    let report = Pipeline::new(&config, &source)
        .run(Stage::Categories)
        .await
        .unwrap();

    let derecho = report.domain("Derecho").unwrap();
    assert!(derecho.partition.reasons.is_empty());
    assert_eq!(
        derecho.taxonomy.categories.get("Derecho").unwrap(),
        ["Derecho civil", "Derecho penal"]
    );
}
