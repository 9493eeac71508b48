use blk_core::{
    closest_parent_key, closest_parent_path, entry_at, find_path_of_key, find_path_of_value,
    find_value_of_key, parse, path, serialize, set_value_at, value_at, value_at_mut, Block, Path,
    PathStyle, Scope, Tree, Value,
};

/// A trimmed-down mission document with two units sharing the same block key.
fn mission() -> Tree {
    parse(
        r#"mission_settings{
  player{
    army:i=1
    wing:t="t1"
  }
  mission{
    type:t="singleMission"
    locName:t="Test Mission"
  }
}
imports{
}
units{
  tankModels{
    name:t="t1"
    tm:m=[[1,0,0] [0,1,0] [0,0,1] [10,0,5]]
    unit_class:t="us_m1_abrams"
    weapons:t="us_m1_abrams_default"
    bullets0:t="us_105mm_m774"
    bulletsCount0:i=40
    props{
      army:i=1
      count:i=1
    }
  }
  tankModels{
    name:t="t2"
    unit_class:t="germ_leopard_2a4"
    props{
      army:i=2
    }
  }
}
"#,
    )
    .unwrap()
}

// ============================================================================
// value_at / entry_at
// ============================================================================

#[test]
fn value_at_by_keys() {
    let tree = mission();
    assert_eq!(
        value_at(&tree, &path!["mission_settings", "player", "wing"]),
        Some(&Value::from("t1"))
    );
}

#[test]
fn value_at_by_index_reaches_duplicate_keys() {
    let tree = mission();
    assert_eq!(
        value_at(&tree, &path!["units", 0usize, "name"]),
        Some(&Value::from("t1"))
    );
    assert_eq!(
        value_at(&tree, &path!["units", 1usize, "name"]),
        Some(&Value::from("t2"))
    );
}

#[test]
fn key_segment_takes_first_match() {
    let tree = mission();
    assert_eq!(
        value_at(&tree, &path!["units", "tankModels", "name"]),
        Some(&Value::from("t1"))
    );
}

#[test]
fn value_at_returns_blocks() {
    let tree = mission();
    let imports = value_at(&tree, &path!["imports"]).unwrap();
    assert_eq!(imports, &Value::Block(Block::new()));
}

#[test]
fn value_at_unresolvable_paths() {
    let tree = mission();
    assert_eq!(value_at(&tree, &path!["nope"]), None);
    assert_eq!(value_at(&tree, &path!["units", 5usize]), None);
    assert_eq!(
        value_at(&tree, &path!["mission_settings", "player", "wing", "deeper"]),
        None
    );
    assert_eq!(value_at(&tree, &Path::new()), None);
}

#[test]
fn entry_at_returns_key_and_value() {
    let tree = mission();
    let entry = entry_at(&tree, &path!["units", 1usize]).unwrap();
    assert_eq!(entry.key, "tankModels");
    assert!(entry.value.is_block());

    let entry = entry_at(&tree, &path!["mission_settings", "mission", "locName"]).unwrap();
    assert_eq!(entry.key, "locName");
    assert_eq!(entry.value, Value::from("Test Mission"));
}

// ============================================================================
// Searches
// ============================================================================

#[test]
fn find_value_unscoped_is_preorder() {
    let tree = mission();
    assert_eq!(
        find_path_of_value(&tree, &Value::from("t1"), None, PathStyle::Keys),
        Some(path!["mission_settings", "player", "wing"])
    );
    assert_eq!(
        find_path_of_value(&tree, &Value::from("t1"), None, PathStyle::Indices),
        Some(path![0usize, 0usize, 1usize])
    );
}

#[test]
fn find_value_scoped_to_parent_key() {
    let tree = mission();
    assert_eq!(
        find_path_of_value(
            &tree,
            &Value::from("t1"),
            Some("tankModels"),
            PathStyle::Indices
        ),
        Some(path![2usize, 0usize, 0usize])
    );
    assert_eq!(
        find_path_of_value(
            &tree,
            &Value::from("t1"),
            Some("tankModels"),
            PathStyle::Keys
        ),
        Some(path!["units", "tankModels", "name"])
    );
}

#[test]
fn find_value_scoped_searches_nested_children() {
    let tree = mission();
    assert_eq!(
        find_path_of_value(&tree, &Value::Int(2), Some("props"), PathStyle::Indices),
        Some(path![2usize, 1usize, 2usize, 0usize])
    );
    assert_eq!(
        find_path_of_value(
            &tree,
            &Value::from("germ_leopard_2a4"),
            Some("units"),
            PathStyle::Indices
        ),
        Some(path![2usize, 1usize, 1usize])
    );
}

#[test]
fn find_value_scope_excludes_other_subtrees() {
    let tree = mission();
    assert_eq!(
        find_path_of_value(&tree, &Value::from("Test Mission"), Some("units"), PathStyle::Keys),
        None
    );
    assert_eq!(
        find_path_of_value(&tree, &Value::from("t1"), Some("armada"), PathStyle::Keys),
        None
    );
}

#[test]
fn find_value_compares_types_strictly() {
    let tree = mission();
    assert_eq!(
        find_path_of_value(&tree, &Value::Real(40.0), None, PathStyle::Keys),
        None
    );
    assert_eq!(
        find_path_of_value(&tree, &Value::Int(40), None, PathStyle::Keys),
        Some(path!["units", "tankModels", "bulletsCount0"])
    );
}

#[test]
fn find_key() {
    let tree = mission();
    assert_eq!(
        find_path_of_key(&tree, "unit_class", PathStyle::Keys),
        Some(path!["units", "tankModels", "unit_class"])
    );
    assert_eq!(
        find_path_of_key(&tree, "unit_class", PathStyle::Indices),
        Some(path![2usize, 0usize, 2usize])
    );
    assert_eq!(
        find_path_of_key(&tree, "units", PathStyle::Keys),
        Some(path!["units"])
    );
    assert_eq!(find_path_of_key(&tree, "missing", PathStyle::Keys), None);
}

#[test]
fn find_value_of_key_with_scopes() {
    let tree = mission();
    assert_eq!(find_value_of_key(&tree, "army", None), Some(&Value::Int(1)));
    assert_eq!(
        find_value_of_key(&tree, "army", Some(Scope::Key("props"))),
        Some(&Value::Int(1))
    );
    assert_eq!(
        find_value_of_key(&tree, "army", Some(Scope::Path(&path!["units", 1usize]))),
        Some(&Value::Int(2))
    );
    assert_eq!(
        find_value_of_key(&tree, "locName", Some(Scope::Key("units"))),
        None
    );
    assert_eq!(
        find_value_of_key(&tree, "army", Some(Scope::Path(&path!["nope"]))),
        None
    );
}

// ============================================================================
// Parents
// ============================================================================

#[test]
fn closest_parent_by_key() {
    let tree = mission();
    assert_eq!(closest_parent_key(&tree, "wing"), Some("player"));
    assert_eq!(closest_parent_key(&tree, "army"), Some("player"));
    assert_eq!(closest_parent_key(&tree, "count"), Some("props"));
    assert_eq!(closest_parent_key(&tree, "units"), None);
    assert_eq!(closest_parent_key(&tree, "missing"), None);
}

#[test]
fn closest_parent_by_path() {
    let tree = mission();
    assert_eq!(
        closest_parent_path(&tree, &path![2usize, 0usize, 2usize]),
        Some(path![2usize, 0usize])
    );
    assert_eq!(
        closest_parent_path(&tree, &path!["mission_settings", "player", "wing"]),
        Some(path!["mission_settings", "player"])
    );
}

#[test]
fn closest_parent_path_edge_cases() {
    let tree = mission();
    assert_eq!(closest_parent_path(&tree, &Path::new()), None);
    assert_eq!(closest_parent_path(&tree, &path!["units"]), None);
    assert_eq!(closest_parent_path(&tree, &path!["nope", "x"]), None);
    assert_eq!(
        closest_parent_path(&tree, &path!["mission_settings", "player", "wing", "x"]),
        None
    );
}

#[test]
fn locate_unit_by_wing_then_read_sibling() {
    let tree = mission();
    let wing = value_at(&tree, &path!["mission_settings", "player", "wing"])
        .unwrap()
        .clone();
    let unit = find_path_of_value(&tree, &wing, Some("tankModels"), PathStyle::Indices).unwrap();
    let parent = closest_parent_path(&tree, &unit).unwrap();
    assert_eq!(
        value_at(&tree, &parent.join("unit_class")),
        Some(&Value::from("us_m1_abrams"))
    );
}

// ============================================================================
// Mutation
// ============================================================================

#[test]
fn set_value_in_nested_block() {
    let mut tree = parse("block{\n x:r=1.5\n}\n").unwrap();
    assert!(set_value_at(&mut tree, &path!["block", "x"], Value::Real(2.0)));
    assert_eq!(
        tree,
        Block::new().with("block", Block::new().with("x", Value::Real(2.0)))
    );
    assert_eq!(
        value_at(&tree, &path!["block", "x"]),
        Some(&Value::Real(2.0))
    );
}

#[test]
fn set_value_by_index_targets_the_right_duplicate() {
    let mut tree = mission();
    let target = path!["units", 1usize, "unit_class"];
    assert!(set_value_at(&mut tree, &target, Value::from("ussr_t_72a")));
    assert_eq!(value_at(&tree, &target), Some(&Value::from("ussr_t_72a")));
    assert_eq!(
        value_at(&tree, &path!["units", 0usize, "unit_class"]),
        Some(&Value::from("us_m1_abrams"))
    );
}

#[test]
fn set_value_can_change_kind() {
    let mut tree = mission();
    let target = path!["units", 0usize, "props"];
    assert!(set_value_at(&mut tree, &target, Value::Bool(true)));
    assert_eq!(value_at(&tree, &target), Some(&Value::Bool(true)));
}

#[test]
fn set_value_on_first_duplicate_only() {
    let mut tree = parse("a:i=1\na:i=2\n").unwrap();
    assert!(set_value_at(&mut tree, &path!["a"], Value::Int(9)));
    assert_eq!(serialize(&tree).unwrap(), "a:i=9\na:i=2");
}

#[test]
fn set_value_unresolvable_is_a_no_op() {
    let mut tree = mission();
    let before = tree.clone();
    assert!(!set_value_at(&mut tree, &path!["mission_settings", "player", "missing"], Value::Int(1)));
    assert!(!set_value_at(&mut tree, &path!["units", 9usize], Value::Int(1)));
    assert!(!set_value_at(&mut tree, &path!["nope", "x"], Value::Int(1)));
    assert!(!set_value_at(
        &mut tree,
        &path!["mission_settings", "player", "wing", "x"],
        Value::Int(1)
    ));
    assert!(!set_value_at(&mut tree, &Path::new(), Value::Int(1)));
    assert_eq!(tree, before);
}

#[test]
fn mutation_is_in_place_and_snapshots_are_explicit() {
    let mut tree = mission();
    let snapshot = tree.clone();
    let target = path!["mission_settings", "mission", "locName"];
    assert!(set_value_at(&mut tree, &target, Value::from("Renamed")));
    assert_eq!(value_at(&tree, &target), Some(&Value::from("Renamed")));
    assert_eq!(value_at(&snapshot, &target), Some(&Value::from("Test Mission")));
}

#[test]
fn mutation_preserves_order() {
    let mut tree = parse("c:i=1\nb:i=2\na:i=3\n").unwrap();
    assert!(set_value_at(&mut tree, &path!["b"], Value::from("x")));
    let keys: Vec<_> = tree.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, ["c", "b", "a"]);
}

#[test]
fn value_at_mut_edits_in_place() {
    let mut tree = mission();
    if let Some(Value::Int(n)) = value_at_mut(&mut tree, &path!["units", 0usize, "bulletsCount0"]) {
        *n += 2;
    }
    assert_eq!(
        value_at(&tree, &path!["units", 0usize, "bulletsCount0"]),
        Some(&Value::Int(42))
    );
}

// ============================================================================
// Path text form
// ============================================================================

#[test]
fn path_text_roundtrip() {
    let p: Path = "units/#1/props/army".parse().unwrap();
    assert_eq!(p, path!["units", 1usize, "props", "army"]);
    assert_eq!(p.to_string(), "units/#1/props/army");
}

#[test]
fn path_text_rejects_garbage() {
    assert!("units//x".parse::<Path>().is_err());
    assert!("units/#x".parse::<Path>().is_err());
    assert!("a b".parse::<Path>().is_err());
    assert_eq!("".parse::<Path>().unwrap(), Path::new());
}
