use crate::zod::config::GenerateOptions;
use crate::zod::generator::{generate, GenerateError};
use crate::zod::resolver::ResolutionState;

const SUPERMAN: &str = r#"
    export type Name = "superman" | "clark kent" | "kal-l";

    // Declared before the type it depends on
    export type BadassSuperman = Omit<Superman, "age">;

    export interface Superman {
        name: Name;
        age: number;
        /**
         * @format email
         */
        email: string;
    }
"#;

#[test]
fn test_generate_in_dependency_order() {
    let output = generate(GenerateOptions::new(SUPERMAN)).unwrap();
    let file = output.get_zod_schemas_file("./superman");

    assert!(output.errors.is_empty(), "{:?}", output.errors);

    let name = file.find("export const nameSchema").unwrap();
    let superman = file.find("export const supermanSchema").unwrap();
    let badass = file.find("export const badassSupermanSchema").unwrap();
    assert!(name < superman && superman < badass);

    assert!(file.contains("email: z.string().email(),"));
    assert!(file.contains("name: nameSchema,"));
    assert!(file.contains(
        "export const badassSupermanSchema = supermanSchema.omit({ age: true });"
    ));
    assert!(!file.contains("import { Superman"));
    assert!(!output.has_circular_dependencies());
}

#[test]
fn test_generated_file_text() {
    let output = generate(GenerateOptions::new(SUPERMAN)).unwrap();

    assert_eq!(
        output.get_zod_schemas_file("./superman"),
        r#"// Generated by ts-to-zod
import { z } from "zod";

export const nameSchema = z.union([z.literal("superman"), z.literal("clark kent"), z.literal("kal-l")]);

export const supermanSchema = z.object({
  name: nameSchema,
  age: z.number(),
  email: z.string().email(),
});

export const badassSupermanSchema = supermanSchema.omit({ age: true });
"#
    );
}

#[test]
fn test_trailing_format_comment() {
    let source = r#"
        export type BadassSuperman = Omit<Superman, "age">;
        export type Name = "a" | "b";
        export interface Superman { name: Name; age: number; email: string /* @format email */ }
    "#;
    let output = generate(GenerateOptions::new(source)).unwrap();
    let file = output.get_zod_schemas_file("./superman");

    assert!(output.errors.is_empty(), "{:?}", output.errors);
    assert!(file.contains("email: z.string().email(),"));

    let name = file.find("export const nameSchema").unwrap();
    let superman = file.find("export const supermanSchema").unwrap();
    let badass = file.find("export const badassSupermanSchema").unwrap();
    assert!(name < superman && superman < badass);
}

#[test]
fn test_self_reference_is_lazy() {
    let source = r#"
        export interface Vilain {
            name: string;
            friends: Vilain[];
        }
    "#;
    let output = generate(GenerateOptions::new(source)).unwrap();
    let file = output.get_zod_schemas_file("./vilain");

    assert!(output.errors.is_empty());
    assert!(output.has_circular_dependencies());
    assert!(file.contains("import { Vilain } from \"./vilain\";"));
    assert!(file.contains(
        "export const vilainSchema: z.ZodSchema<Vilain> = z.lazy(() => z.object({"
    ));
    assert!(file.contains("friends: z.array(vilainSchema),"));
    assert!(file.ends_with("}));\n"));
}

#[test]
fn test_mutual_cycle_is_not_generated() {
    let source = r#"
        export interface EvilPlan {
            details: EvilPlanDetails;
        }

        export interface EvilPlanDetails {
            parent: EvilPlan;
        }
    "#;
    let output = generate(GenerateOptions::new(source)).unwrap();
    let file = output.get_zod_schemas_file("./evil");
    let integration = output.get_integration_tests_file("./evil", "./evil.zod");

    assert!(!file.contains("export const"));
    assert!(!integration.contains("expectType<spec."));
    assert_eq!(output.errors.len(), 1);
    assert!(output.errors[0].contains("EvilPlan"));
    assert!(output.errors[0].contains("EvilPlanDetails"));
    assert!(output
        .resolutions()
        .iter()
        .all(|r| r.state == ResolutionState::Unresolved));
}

#[test]
fn test_cycles_sharing_a_dependent_are_reported_apart() {
    let source = r#"
        export interface User { a: C1; b: O1 }
        export interface C1 { c: C2 }
        export interface C2 { c: C1 }
        export interface O1 { o: O2 }
        export interface O2 { o: O1 }
    "#;
    let output = generate(GenerateOptions::new(source)).unwrap();

    assert_eq!(output.errors.len(), 2);
    assert_eq!(
        output.errors[0],
        "Some schemas can't be generated due to circular dependencies:\nUser\nC1\nC2"
    );
    assert_eq!(
        output.errors[1],
        "Some schemas can't be generated due to circular dependencies:\nO1\nO2"
    );
    assert_eq!(
        output.unresolved_groups(),
        &[
            vec!["User".to_string(), "C1".to_string(), "C2".to_string()],
            vec!["O1".to_string(), "O2".to_string()],
        ]
    );
}

#[test]
fn test_private_types_needing_an_import_are_reported() {
    let source = r#"
        interface Tree { children: Tree[] }
        enum Power { Flight }
        export interface Hero { power: Power }
    "#;
    let output = generate(GenerateOptions::new(source)).unwrap();
    let file = output.get_zod_schemas_file("./tree");

    assert!(file.contains("export const treeSchema: z.ZodSchema<Tree> = z.lazy(() =>"));
    assert_eq!(
        output.errors,
        vec![
            "Tree must be exported: its schema imports the type from the source module"
                .to_string(),
            "Power must be exported: its schema imports the type from the source module"
                .to_string(),
        ]
    );
    assert!(output.unresolved_groups().is_empty());
}

#[test]
fn test_forward_references_are_not_cycles() {
    let source = r#"
        export type A = { b: B; c: C };
        export type B = { c: C };
        export type C = string;
    "#;
    let output = generate(GenerateOptions::new(source)).unwrap();

    assert!(output.errors.is_empty());
    let order: Vec<&str> = output
        .resolutions()
        .iter()
        .map(|r| r.name.as_str())
        .collect();
    assert_eq!(order, vec!["C", "B", "A"]);
}

#[test]
fn test_integration_file_counts_exported_schemas() {
    let source = r#"
        export type Name = string;
        type Internal = number;
        export interface Hero { name: Name; power: Internal }
        export type Skipped = boolean;
    "#;
    let output = generate(
        GenerateOptions::new(source).name_filter(|name| name != "Skipped"),
    )
    .unwrap();
    let integration = output.get_integration_tests_file("./hero", "./hero.zod");

    assert!(integration.contains("import * as spec from \"./hero\";"));
    assert!(integration.contains("import * as generated from \"./hero.zod\";"));
    assert!(integration.contains("expectType<spec.Name>({} as nameSchemaInferredType);"));
    assert!(integration.contains("expectType<heroSchemaInferredType>({} as spec.Hero);"));
    assert!(!integration.contains("Internal"));
    assert!(!integration.contains("Skipped"));
    assert_eq!(integration.matches("({} as ").count(), 4);

    // Non-exported declarations still get a schema
    let file = output.get_zod_schemas_file("./hero");
    assert!(file.contains("export const internalSchema = z.number();"));
    assert!(!file.contains("skippedSchema"));
}

#[test]
fn test_filtered_dependency_does_not_block() {
    let source = r#"
        export type External = string;
        export interface Hero { tag: External }
    "#;
    let output = generate(GenerateOptions::new(source).name_filter(|name| name == "Hero")).unwrap();

    assert!(output.errors.is_empty());
    assert!(output
        .get_zod_schemas_file("./hero")
        .contains("tag: externalSchema,"));
}

#[test]
fn test_partial_comes_before_required() {
    let source = r#"
        export interface Hero { name: string }
        export type Loose = Required<Partial<Hero>>;
        export type Strict = Partial<Required<Hero>>;
    "#;
    let output = generate(GenerateOptions::new(source)).unwrap();
    let file = output.get_zod_schemas_file("./hero");

    assert!(file.contains("export const looseSchema = heroSchema.partial().required();"));
    assert!(file.contains("export const strictSchema = heroSchema.partial().required();"));
}

#[test]
fn test_unsupported_declaration_is_reported() {
    let source = r#"
        export type Keys = keyof Hero;
        export type UsesKeys = { keys: Keys };
        export interface Hero { name: string }
    "#;
    let output = generate(GenerateOptions::new(source)).unwrap();
    let file = output.get_zod_schemas_file("./hero");

    assert_eq!(output.errors.len(), 2);
    assert!(output.errors[0].starts_with("Keys can't be generated"));
    assert!(output.errors[1].contains("UsesKeys"));
    assert!(file.contains("export const heroSchema"));
    assert!(!file.contains("keysSchema ="));
}

#[test]
fn test_max_run_limits_resolution() {
    let source = r#"
        export type A = B;
        export type B = C;
        export type C = D;
        export type D = string;
    "#;
    let output = generate(GenerateOptions::new(source).max_run(2)).unwrap();

    let resolved: Vec<&str> = output
        .schemas()
        .iter()
        .map(|s| s.type_name.as_str())
        .collect();
    assert_eq!(resolved, vec!["D", "C"]);
    assert_eq!(output.errors.len(), 1);
    assert!(output.errors[0].contains("A\nB"));
}

#[test]
fn test_strict_and_keep_comments() {
    let source = r#"
        /** A hero */
        export interface Hero {
            /** Secret identity */
            name: string;
        }
    "#;

    let output = generate(GenerateOptions::new(source).strict(true).keep_comments(true)).unwrap();
    let file = output.get_zod_schemas_file("./hero");
    assert!(file.contains("/** A hero */\nexport const heroSchema = z.object({"));
    assert!(file.contains("  /** Secret identity */\n  name: z.string(),"));
    assert!(file.contains("}).strict();"));

    let output = generate(GenerateOptions::new(source)).unwrap();
    let file = output.get_zod_schemas_file("./hero");
    assert!(!file.contains("A hero"));
    assert!(!file.contains("strict"));
}

#[test]
fn test_custom_schema_names() {
    let source = "export interface Hero { sidekick: Sidekick }\nexport type Sidekick = string;";
    let output = generate(
        GenerateOptions::new(source).get_schema_name(|name| format!("{}Validator", name)),
    )
    .unwrap();
    let file = output.get_zod_schemas_file("./hero");

    assert!(file.contains("export const SidekickValidator = z.string();"));
    assert!(file.contains("sidekick: SidekickValidator,"));
}

#[test]
fn test_enums_are_imported() {
    let source = r#"
        export enum Power { Flight = "flight", Strength = "strength" }
        export interface Hero { power: Power }
    "#;
    let output = generate(GenerateOptions::new(source)).unwrap();
    let file = output.get_zod_schemas_file("./hero");

    assert!(file.contains("import { Power } from \"./hero\";"));
    assert!(file.contains("export const powerSchema = z.nativeEnum(Power);"));
    assert!(file.contains("power: powerSchema,"));
}

#[test]
fn test_parse_failure_is_an_error() {
    let result = generate(GenerateOptions::new("interface Broken { name: ; }"));
    match result {
        Err(GenerateError::Parse(err)) => {
            assert!(err.to_string().starts_with("Error at line 1"));
        }
        Ok(_) => panic!("expected a parse error"),
    }
}
