//! Patch descriptors and the embedded Mautic catalog.
//!
//! Mautic's segment filter builders generate `WHERE date_col = ''` and
//! `WHERE date_col <> ''` for the empty/notEmpty operators. MySQL 8.0.16+
//! rejects those comparisons on DATE/DATETIME columns regardless of
//! sql_mode (error 1525, "Incorrect DATE value: ''"). The fix simplifies
//! empty to IS NULL and notEmpty to IS NOT NULL, which is safe because a
//! date column cannot store an empty string.
//!
//! Upstream: https://github.com/mautic/mautic/issues/10686
//!
//! Matching is deliberately literal. The search texts below must mirror the
//! upstream source byte-for-byte, indentation and blank lines included; if
//! upstream drifts, the applier reports the miss instead of guessing.

use regex::Regex;
use std::path::{Path, PathBuf};

/// One exact-text substitution rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplacementRule {
    pub search_text: String,
    pub replace_text: String,
}

impl ReplacementRule {
    pub fn new(search_text: impl Into<String>, replace_text: impl Into<String>) -> Self {
        Self {
            search_text: search_text.into(),
            replace_text: replace_text.into(),
        }
    }
}

/// All replacement rules for one target file, applied in order to the
/// evolving content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchSpec {
    pub target_path: PathBuf,
    pub replacements: Vec<ReplacementRule>,
}

impl PatchSpec {
    pub fn new(target_path: impl Into<PathBuf>, replacements: Vec<ReplacementRule>) -> Self {
        Self {
            target_path: target_path.into(),
            replacements,
        }
    }

    /// Short file name for console output.
    pub fn short_name(&self) -> String {
        self.target_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.target_path.display().to_string())
    }
}

/// Forbidden construct the verifier scans for after patching: a quoted
/// empty string inside a `literal(...)` call.
pub const FORBIDDEN_EMPTY_LITERAL: &str = r"literal\s*\(\s*''\s*\)";

pub fn forbidden_empty_literal() -> Regex {
    Regex::new(FORBIDDEN_EMPTY_LITERAL).expect("static pattern compiles")
}

const COMPLEX_RELATION_BUILDER: &str =
    "docroot/app/bundles/LeadBundle/Segment/Query/Filter/ComplexRelationValueFilterQueryBuilder.php";
const FOREIGN_FUNC_BUILDER: &str =
    "docroot/app/bundles/LeadBundle/Segment/Query/Filter/ForeignFuncFilterQueryBuilder.php";
const OPERATOR_SUBSCRIBER: &str =
    "docroot/app/bundles/LeadBundle/EventListener/SegmentOperatorQuerySubscriber.php";

/// The full date-empty-filter patch set, with target paths resolved
/// against the Mautic installation root.
pub fn date_empty_filter_patches(root: &Path) -> Vec<PatchSpec> {
    vec![
        // ComplexRelationValueFilterQueryBuilder (company fields via JOIN)
        PatchSpec::new(
            root.join(COMPLEX_RELATION_BUILDER),
            vec![
                // empty: CompositeExpression(OR, [isNull, eq('')]) -> isNull only
                ReplacementRule::new(
                    concat!(
                        "case 'empty':\n",
                        "                $expression = new CompositeExpression(CompositeExpression::TYPE_OR,\n",
                        "                    [\n",
                        "                        $queryBuilder->expr()->isNull($tableAlias.'.'.$filter->getField()),\n",
                        "                        $queryBuilder->expr()->eq($tableAlias.'.'.$filter->getField(), $queryBuilder->expr()->literal('')),\n",
                        "                    ]\n",
                        "                );\n",
                        "                break;",
                    ),
                    concat!(
                        "case 'empty':\n",
                        "                $expression = $queryBuilder->expr()->isNull($tableAlias.'.'.$filter->getField());\n",
                        "                break;",
                    ),
                ),
                // notEmpty: CompositeExpression(AND, [isNotNull, neq('')]) -> isNotNull only.
                // Upstream has a blank line between ); and break; in this case.
                ReplacementRule::new(
                    concat!(
                        "case 'notEmpty':\n",
                        "                $expression = new CompositeExpression(CompositeExpression::TYPE_AND,\n",
                        "                    [\n",
                        "                        $queryBuilder->expr()->isNotNull($tableAlias.'.'.$filter->getField()),\n",
                        "                        $queryBuilder->expr()->neq($tableAlias.'.'.$filter->getField(), $queryBuilder->expr()->literal('')),\n",
                        "                    ]\n",
                        "                );\n",
                        "\n",
                        "                break;",
                    ),
                    concat!(
                        "case 'notEmpty':\n",
                        "                $expression = $queryBuilder->expr()->isNotNull($tableAlias.'.'.$filter->getField());\n",
                        "                break;",
                    ),
                ),
            ],
        ),
        // ForeignFuncFilterQueryBuilder (aggregate function fields)
        PatchSpec::new(
            root.join(FOREIGN_FUNC_BUILDER),
            vec![
                // empty: or(isNull, eq(:param='')) -> isNull only
                ReplacementRule::new(
                    concat!(
                        "case 'empty':\n",
                        "                $expression = $queryBuilder->expr()->or(\n",
                        "                    $queryBuilder->expr()->isNull($tableAlias.'.'.$filter->getField()),\n",
                        "                    $queryBuilder->expr()->eq($tableAlias.'.'.$filter->getField(), ':'.$emptyParameter = $this->generateRandomParameterName())\n",
                        "                );\n",
                        "                $queryBuilder->setParameter($emptyParameter, '');\n",
                        "                break;",
                    ),
                    concat!(
                        "case 'empty':\n",
                        "                $expression = $queryBuilder->expr()->isNull($tableAlias.'.'.$filter->getField());\n",
                        "                break;",
                    ),
                ),
                // notEmpty: and(isNotNull, neq(:param='')) -> isNotNull only
                ReplacementRule::new(
                    concat!(
                        "case 'notEmpty':\n",
                        "                $expression = $queryBuilder->expr()->and(\n",
                        "                    $queryBuilder->expr()->isNotNull($tableAlias.'.'.$filter->getField()),\n",
                        "                    $queryBuilder->expr()->neq($tableAlias.'.'.$filter->getField(), ':'.$emptyParameter = $this->generateRandomParameterName())\n",
                        "                );\n",
                        "                $queryBuilder->setParameter($emptyParameter, '');\n",
                        "                break;",
                    ),
                    concat!(
                        "case 'notEmpty':\n",
                        "                $expression = $queryBuilder->expr()->isNotNull($tableAlias.'.'.$filter->getField());\n",
                        "                break;",
                    ),
                ),
            ],
        ),
        // SegmentOperatorQuerySubscriber (base table fields on leads).
        // The doesColumnSupportEmptyValue() guard should already prevent the
        // eq('') branch for date/datetime columns, but we remove it entirely.
        // For varchar fields IS NULL alone is sufficient in practice because
        // truly empty columns store NULL, not the empty string.
        PatchSpec::new(
            root.join(OPERATOR_SUBSCRIBER),
            vec![
                // onEmptyOperator: drop the conditional eq('') addition
                ReplacementRule::new(
                    concat!(
                        "$parts           = [$expr->isNull($field)];\n",
                        "\n",
                        "        if ($filter->doesColumnSupportEmptyValue()) {\n",
                        "            $parts[] = $expr->eq($field, $expr->literal(''));\n",
                        "        }\n",
                        "\n",
                        "        $event->addExpression(new CompositeExpression(CompositeExpression::TYPE_OR, $parts));",
                    ),
                    concat!(
                        "$expression = $expr->isNull($field);\n",
                        "\n",
                        "        $event->addExpression($expression);",
                    ),
                ),
                // onNotEmptyOperator: drop the conditional neq('') addition
                ReplacementRule::new(
                    concat!(
                        "$parts           = [$expr->isNotNull($field)];\n",
                        "\n",
                        "        if ($filter->doesColumnSupportEmptyValue()) {\n",
                        "            $parts[] = $expr->neq($field, $expr->literal(''));\n",
                        "        }\n",
                        "\n",
                        "        $event->addExpression(new CompositeExpression(CompositeExpression::TYPE_AND, $parts));",
                    ),
                    concat!(
                        "$expression = $expr->isNotNull($field);\n",
                        "\n",
                        "        $event->addExpression($expression);",
                    ),
                ),
            ],
        ),
    ]
}
