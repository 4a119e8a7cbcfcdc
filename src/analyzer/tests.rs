//! Tests for the analyzer module

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;
use crate::classifier::{classify, RawField};
use crate::extractor::ConstraintExtractor;
use crate::models::{ConstraintAttribute, InstructionArgument};
use crate::syntax::SyntaxTree;

fn extract(source: &str) -> Vec<Constraints> {
    let tree = SyntaxTree::parse(source).unwrap();
    ConstraintExtractor::new(&tree, "test.rs").extract_all_constraints()
}

fn analyze_one(source: &str) -> DefinitionGraph {
    let constraints = extract(source);
    assert_eq!(constraints.len(), 1, "expected a single validation struct");
    DefinitionAnalyzer::new(&constraints[0], &AnalyzerConfig::default()).analyze()
}

fn field(name: &str, type_name: &str, attributes: Vec<ConstraintAttribute>) -> AccountField {
    classify(RawField {
        name: name.to_string(),
        type_name: type_name.to_string(),
        attributes,
        line_number: None,
        comment: None,
    })
}

fn status(graph: &DefinitionGraph, name: &str) -> DefinitionStatus {
    graph.get(name).unwrap().status
}

const VAULT: &str = r#"
use anchor_lang::prelude::*;

#[derive(Accounts)]
pub struct Deposit<'info> {
    #[account(mut)]
    pub user: Signer<'info>,
    #[account(mut, seeds = [b"vault", user.key().as_ref()], bump)]
    pub vault: Account<'info, Vault>,
    pub system_program: Program<'info, System>,
}
"#;

#[test]
fn test_default_account() {
    let graph = analyze_one(VAULT);
    let system_program = graph.get("system_program").unwrap();
    assert_eq!(system_program.status, DefinitionStatus::Defined);
    assert_eq!(system_program.defined_by.len(), 1);
    assert_eq!(system_program.defined_by[0].source_type, SourceType::Default);
    assert_eq!(
        system_program.defined_by[0].details,
        "System program or standard account"
    );
}

#[test]
fn test_seeds_end_to_end() {
    let constraints = extract(VAULT);
    let config = AnalyzerConfig::default();
    let mut analyzer = DefinitionAnalyzer::new(&constraints[0], &config);
    analyzer.analyze_accounts();

    let user = analyzer.graph.get("user").unwrap().clone();
    assert_eq!(user.status, DefinitionStatus::Undefined);
    assert_eq!(user.issues, vec!["Account is not defined by any constraints"]);

    let vault = analyzer.graph.get("vault").unwrap().clone();
    assert_eq!(vault.status, DefinitionStatus::Defined);
    let sources: Vec<String> = vault.defined_by.iter().map(ToString::to_string).collect();
    assert_eq!(sources, vec!["constant:b'vault' (seed)", "account:user (seed)"]);
    assert_eq!(
        vault.defined_by[1].details,
        "Referenced in seed: user.key().as_ref()"
    );

    analyzer.analyze_reverse_definitions();
    let user = analyzer.graph.get("user").unwrap();
    assert_eq!(user.status, DefinitionStatus::Defined);
    assert!(user.issues.is_empty());
    assert_eq!(user.defined_by.len(), 1);
    assert_eq!(user.defined_by[0].connection_type, ConnectionType::ContainsAsSeed);
    assert_eq!(user.defined_by[0].source_name.as_deref(), Some("vault"));
    assert_eq!(
        user.defined_by[0].details,
        "Reverse definition: used in seeds of non-init account 'vault'"
    );

    assert_eq!(analyzer.graph.defined_count(), 3);
    assert_eq!(analyzer.graph.undefined_count(), 0);
    assert!(analyzer.graph.is_consistent());
}

#[test]
fn test_constants_collected() {
    let graph = analyze_one(VAULT);
    // a bare `bump` resolves to itself and is not a constant
    assert_eq!(graph.constants, vec!["b'vault'"]);

    let graph = analyze_one(
        r#"
#[derive(Accounts)]
pub struct Fixed<'info> {
    #[account(seeds = [b"fixed", SEED], bump = 254)]
    pub pda: Account<'info, Pda>,
}
"#,
    );
    assert_eq!(graph.constants, vec!["254", "SEED", "b'fixed'"]);
    let sources: Vec<String> = graph
        .get("pda")
        .unwrap()
        .defined_by
        .iter()
        .map(ToString::to_string)
        .collect();
    assert_eq!(
        sources,
        vec!["constant:b'fixed' (seed)", "constant:SEED (seed)", "constant:254 (seed_bump)"]
    );
}

#[test]
fn test_associated_token_missing_authority() {
    let graph = analyze_one(
        r#"
#[derive(Accounts)]
pub struct Swap<'info> {
    pub mint: Account<'info, Mint>,
    #[account(associated_token::mint = mint)]
    pub ata: Account<'info, TokenAccount>,
}
"#,
    );

    let ata = graph.get("ata").unwrap();
    assert_eq!(ata.account_type, AccountType::AssociatedToken);
    assert_eq!(ata.status, DefinitionStatus::IncorrectlyDefined);
    assert_eq!(
        ata.issues,
        vec!["Missing 'associated_token::authority' constraint"]
    );
    assert_eq!(ata.defined_by[0].connection_type, ConnectionType::AtMint);
}

#[test]
fn test_associated_token_statuses() {
    let graph = analyze_one(
        r#"
#[derive(Accounts)]
pub struct Take<'info> {
    pub taker: Signer<'info>,
    pub mint: Account<'info, Mint>,
    #[account(mut, associated_token::mint = mint, associated_token::authority = taker)]
    pub good: Account<'info, TokenAccount>,
    #[account(mut, associated_token::mint = mint, associated_token::authority = nobody)]
    pub odd: Account<'info, TokenAccount>,
}
"#,
    );

    assert_eq!(status(&graph, "good"), DefinitionStatus::Defined);
    let odd = graph.get("odd").unwrap();
    assert_eq!(odd.status, DefinitionStatus::NeedsReview);
    assert_eq!(
        odd.issues,
        vec!["Authority reference 'nobody' not found in accounts"]
    );
}

#[test]
fn test_associated_token_without_values() {
    let constraints = Constraints {
        accounts: vec![field(
            "ata",
            "Account<'info, TokenAccount>",
            vec![ConstraintAttribute::flag("associated_token::mint")],
        )],
        ..Constraints::new("Broken".to_string())
    };
    let graph = DefinitionAnalyzer::new(&constraints, &AnalyzerConfig::default()).analyze();
    let ata = graph.get("ata").unwrap();
    assert_eq!(ata.status, DefinitionStatus::IncorrectlyDefined);
    assert_eq!(
        ata.issues,
        vec!["Marked as associated token but missing associated_token constraints"]
    );
}

#[test]
fn test_address_constant_recorded_once() {
    let graph = analyze_one(
        r#"
#[derive(Accounts)]
pub struct Admin<'info> {
    #[account(address = ADMIN_KEY)]
    pub admin: Signer<'info>,
    #[account(address = ADMIN_KEY)]
    pub backup_admin: Signer<'info>,
}
"#,
    );

    assert_eq!(status(&graph, "admin"), DefinitionStatus::Defined);
    assert_eq!(status(&graph, "backup_admin"), DefinitionStatus::Defined);
    assert_eq!(graph.constants, vec!["ADMIN_KEY"]);
    let admin = graph.get("admin").unwrap();
    assert_eq!(admin.defined_by[0].source_type, SourceType::Address);
    assert_eq!(admin.defined_by[0].details, "Fixed address constraint");
}

#[test]
fn test_address_literal() {
    let graph = analyze_one(
        r#"
#[derive(Accounts)]
pub struct Transfer<'info> {
    #[account(address = pubkey!("TokenkegQfeZyiNwAJbNbGKPFXCWuBvf9Ss623VQ5DA"))]
    pub spl_token: UncheckedAccount<'info>,
    #[account(address = pubkey!("not-a-key"))]
    pub bogus: UncheckedAccount<'info>,
}
"#,
    );

    let spl_token = graph.get("spl_token").unwrap();
    assert_eq!(
        spl_token.defined_by[0].details,
        "Fixed address constraint (SPL Token program)"
    );
    assert!(spl_token.issues.is_empty());

    let bogus = graph.get("bogus").unwrap();
    assert_eq!(bogus.status, DefinitionStatus::Defined);
    assert_eq!(
        bogus.issues,
        vec!["Address literal 'not-a-key' is not a valid public key"]
    );
}

#[test]
fn test_unknown_seed_reference_needs_review() {
    let graph = analyze_one(
        r#"
#[derive(Accounts)]
#[instruction(id: u64)]
pub struct Open<'info> {
    pub owner: Signer<'info>,
    #[account(seeds = [b"pos", owner.key().as_ref(), &id.to_le_bytes(), market.key().as_ref()], bump)]
    pub position: Account<'info, Position>,
}
"#,
    );

    let position = graph.get("position").unwrap();
    assert_eq!(position.status, DefinitionStatus::NeedsReview);
    assert!(position
        .issues
        .contains(&"Unknown reference 'market' in seeds".to_string()));
    assert!(position
        .defined_by
        .iter()
        .any(|source| source.source_type == SourceType::InstructionArg
            && source.source_name.as_deref() == Some("id")));
    assert_eq!(graph.instruction_args, vec!["id"]);
}

#[test]
fn test_bump_reference() {
    let graph = analyze_one(
        r#"
#[derive(Accounts)]
pub struct Claim<'info> {
    pub config: Account<'info, Config>,
    #[account(seeds = [b"treasury"], bump = config.treasury_bump)]
    pub treasury: Account<'info, Treasury>,
}
"#,
    );

    let treasury = graph.get("treasury").unwrap();
    assert_eq!(treasury.status, DefinitionStatus::Defined);
    let bump = treasury
        .defined_by
        .iter()
        .find(|source| source.connection_type == ConnectionType::SeedBump)
        .unwrap();
    assert_eq!(bump.source_name.as_deref(), Some("config"));
    assert_eq!(bump.source_field_name.as_deref(), Some("treasury_bump"));
    assert_eq!(bump.details, "Referenced in seed_bump: config.treasury_bump");
}

#[test]
fn test_init_without_derivation() {
    let graph = analyze_one(
        r#"
#[derive(Accounts)]
pub struct Create<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,
    #[account(init, payer = payer, space = 8 + 32)]
    pub state: Account<'info, State>,
    pub system_program: Program<'info, System>,
}
"#,
    );

    let state = graph.get("state").unwrap();
    assert!(state.is_inited);
    assert_eq!(state.status, DefinitionStatus::IncorrectlyDefined);
    assert_eq!(
        state.issues,
        vec!["Account has init/init_if_needed but no seeds or associated_token constraints"]
    );
    assert_eq!(graph.needs_review_count(), 1);
}

#[test]
fn test_init_with_seeds() {
    let graph = analyze_one(
        r#"
#[derive(Accounts)]
pub struct Create<'info> {
    #[account(mut)]
    pub payer: Signer<'info>,
    #[account(init, payer = payer, space = 8, seeds = [b"state", payer.key().as_ref()], bump)]
    pub state: Account<'info, State>,
}
"#,
    );

    assert_eq!(status(&graph, "state"), DefinitionStatus::Defined);
    // init accounts do not define what they reference
    assert_eq!(status(&graph, "payer"), DefinitionStatus::Undefined);
}

#[test]
fn test_custom_constraints() {
    let graph = analyze_one(
        r#"
#[derive(Accounts)]
pub struct Settle<'info> {
    pub authority: Signer<'info>,
    #[account(constraint = market.authority == authority.key() @ ErrorCode::Unauthorized)]
    pub market: Account<'info, Market>,
    #[account(constraint = amount > 0)]
    pub other: Account<'info, Other>,
}
"#,
    );

    let market = graph.get("market").unwrap();
    assert_eq!(market.status, DefinitionStatus::NeedsReview);
    assert_eq!(market.defined_by.len(), 1);
    assert_eq!(market.defined_by[0].source_name.as_deref(), Some("authority"));
    assert_eq!(
        market.issues,
        vec!["Defined only by custom constraints - needs manual verification"]
    );

    // nothing resolves, falls through to undefined
    assert_eq!(status(&graph, "other"), DefinitionStatus::Undefined);
}

#[test]
fn test_has_one_reverse_definition() {
    let graph = analyze_one(
        r#"
#[derive(Accounts)]
pub struct Take<'info> {
    pub maker: SystemAccount<'info>,
    pub mint_a: Account<'info, Mint>,
    #[account(mut, has_one = maker, has_one = mint_a, has_one = ghost, seeds = [b"escrow", maker.key().as_ref()], bump = escrow.bump)]
    pub escrow: Account<'info, Escrow>,
}
"#,
    );

    let maker = graph.get("maker").unwrap();
    assert_eq!(maker.status, DefinitionStatus::Defined);
    let connections: Vec<ConnectionType> = maker
        .defined_by
        .iter()
        .map(|source| source.connection_type)
        .collect();
    assert_eq!(
        connections,
        vec![ConnectionType::ContainsAsHasOne, ConnectionType::ContainsAsSeed]
    );
    assert_eq!(status(&graph, "mint_a"), DefinitionStatus::Defined);

    let escrow = graph.get("escrow").unwrap();
    assert!(escrow.issues.contains(
        &"Account ghost for connection contains_as_has_one wasn't found in the graph".to_string()
    ));
    assert_eq!(graph.undefined_count(), 0);
    assert!(graph.is_consistent());
}

#[test]
fn test_reverse_definition_keeps_other_states() {
    let graph = analyze_one(
        r#"
#[derive(Accounts)]
pub struct Update<'info> {
    #[account(init, payer = payer, space = 8)]
    pub data: Account<'info, Data>,
    #[account(has_one = data)]
    pub registry: Account<'info, Registry>,
    #[account(mut)]
    pub payer: Signer<'info>,
}
"#,
    );

    let data = graph.get("data").unwrap();
    assert_eq!(data.status, DefinitionStatus::IncorrectlyDefined);
    // the provenance is still recorded
    assert_eq!(data.defined_by.len(), 1);
    assert_eq!(data.defined_by[0].connection_type, ConnectionType::ContainsAsHasOne);
}

#[test]
fn test_duplicate_account_first_wins() {
    let constraints = Constraints {
        accounts: vec![
            field("user", "Signer<'info>", vec![]),
            field(
                "user",
                "Account<'info, User>",
                vec![ConstraintAttribute::with_value("address", "USER_KEY")],
            ),
        ],
        ..Constraints::new("Dup".to_string())
    };
    let graph = DefinitionAnalyzer::new(&constraints, &AnalyzerConfig::default()).analyze();
    assert_eq!(graph.total_accounts(), 1);
    assert_eq!(status(&graph, "user"), DefinitionStatus::Undefined);
    assert!(graph.constants.is_empty());
}

#[test]
fn test_custom_default_accounts() {
    let constraints = Constraints {
        accounts: vec![field("oracle", "AccountInfo<'info>", vec![])],
        ..Constraints::new("Price".to_string())
    };
    let config = AnalyzerConfig {
        default_accounts: vec!["oracle".to_string()],
        ..AnalyzerConfig::default()
    };
    let graph = DefinitionAnalyzer::new(&constraints, &config).analyze();
    assert_eq!(status(&graph, "oracle"), DefinitionStatus::Defined);
    assert_eq!(graph.source_file, "unknown");
}

#[test]
fn test_detail_width() {
    let long_seed = format!("b\"{}\"", "x".repeat(80));
    let constraints = Constraints {
        accounts: vec![field(
            "pda",
            "Account<'info, Pda>",
            vec![ConstraintAttribute::with_value("seeds", format!("[{}]", long_seed))],
        )],
        ..Constraints::new("Long".to_string())
    };
    let config = AnalyzerConfig {
        detail_width: 10,
        ..AnalyzerConfig::default()
    };
    let graph = DefinitionAnalyzer::new(&constraints, &config).analyze();
    let pda = graph.get("pda").unwrap();
    assert_eq!(pda.defined_by[0].source_name.as_deref(), Some("b'xxxxxxxx"));
    // a seeds constraint without a bump is still defined by its seeds
    assert_eq!(pda.status, DefinitionStatus::Defined);
}

#[test]
fn test_truncate_is_char_based() {
    assert_eq!(truncate("héllo", 2), "hé");
    assert_eq!(truncate("abc", 10), "abc");
}

#[test]
fn test_idempotent() {
    let first = analyze_one(VAULT).to_json().unwrap();
    let second = analyze_one(VAULT).to_json().unwrap();
    assert_eq!(first, second);
}

const NAMES: &[&str] = &["alpha", "beta", "gamma", "delta", "epsilon", "zeta"];
const TYPES: &[&str] = &[
    "Account<'info, Data>",
    "Signer<'info>",
    "AccountInfo<'info>",
    "UncheckedAccount<'info>",
];

fn random_constraints(rng: &mut StdRng) -> Constraints {
    let count = rng.gen_range(1..=NAMES.len());
    let pick = |rng: &mut StdRng| -> String {
        // occasionally point at an account that does not exist
        if rng.gen_bool(0.1) {
            "missing".to_string()
        } else {
            NAMES[rng.gen_range(0..count)].to_string()
        }
    };

    let mut accounts = Vec::new();
    for name in &NAMES[..count] {
        let mut attributes = Vec::new();
        if rng.gen_bool(0.25) {
            attributes.push(ConstraintAttribute::flag("init"));
        }
        for _ in 0..rng.gen_range(0..3) {
            attributes.push(ConstraintAttribute::with_value("has_one", pick(rng)));
        }
        if rng.gen_bool(0.5) {
            let seeds = format!("[b\"tag\", {}.key().as_ref(), {}.index]", pick(rng), pick(rng));
            attributes.push(ConstraintAttribute::with_value("seeds", seeds));
            if rng.gen_bool(0.5) {
                attributes.push(ConstraintAttribute::flag("bump"));
            } else {
                attributes.push(ConstraintAttribute::with_value("bump", format!("{}.bump", pick(rng))));
            }
        }
        if rng.gen_bool(0.2) {
            attributes.push(ConstraintAttribute::with_value(
                "constraint",
                format!("{}.owner == {}.key()", pick(rng), pick(rng)),
            ));
        }
        if rng.gen_bool(0.1) {
            attributes.push(ConstraintAttribute::with_value("associated_token::mint", pick(rng)));
        }
        let type_name = TYPES[rng.gen_range(0..TYPES.len())];
        accounts.push(field(name, type_name, attributes));
    }

    Constraints {
        instruction_args: vec![InstructionArgument {
            name: "index".to_string(),
            type_name: "u64".to_string(),
        }],
        accounts,
        ..Constraints::new("Random".to_string())
    }
}

#[test]
fn test_reverse_pass_is_monotonic() {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let config = AnalyzerConfig::default();

    for _ in 0..500 {
        let constraints = random_constraints(&mut rng);
        let mut analyzer = DefinitionAnalyzer::new(&constraints, &config);
        analyzer.analyze_accounts();
        let before: Vec<(String, DefinitionStatus)> = analyzer
            .graph
            .accounts()
            .map(|definition| (definition.account_name.clone(), definition.status))
            .collect();

        analyzer.analyze_reverse_definitions();
        for (name, old) in before {
            let new = status(&analyzer.graph, &name);
            assert!(
                old == new || (old == DefinitionStatus::Undefined && new == DefinitionStatus::Defined),
                "{}: {} -> {}",
                name,
                old,
                new
            );
        }
    }
}

#[test]
fn test_counters_stay_consistent() {
    let mut rng = StdRng::seed_from_u64(42);
    let config = AnalyzerConfig::default();

    for _ in 0..500 {
        let constraints = random_constraints(&mut rng);
        let graph = DefinitionAnalyzer::new(&constraints, &config).analyze();
        let stats = graph.statistics();
        assert_eq!(
            stats.defined + stats.undefined + stats.needs_review,
            stats.total_accounts
        );
        assert_eq!(stats.total_accounts, constraints.accounts.len());
        assert!(graph.is_consistent());
    }
}
