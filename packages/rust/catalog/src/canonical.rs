//! Raw service name → canonical abbreviation.
//!
//! Table lookup first, prefix heuristics second. Pure and synchronous so the
//! catalog import can run it over thousands of names without I/O.

/// Names whose abbreviation cannot be derived from their shape.
const SPECIAL_CASES: &[(&str, &str)] = &[
    ("AWS IAM Access Analyzer", "AWS IAM"),
    ("AWS Identity and Access Management", "AWS IAM"),
    ("AWS Identity and Access Management Roles Anywhere", "AWS IAM"),
    ("Amazon Elastic Container Registry", "Amazon ECR"),
    ("Amazon Elastic Container Service", "Amazon ECS"),
    ("Amazon Elastic Kubernetes Service", "Amazon EKS"),
    ("Amazon Elastic MapReduce", "Amazon EMR"),
    ("Amazon Elastic Block Store", "Amazon EBS"),
    ("Amazon Elastic File System", "Amazon EFS"),
    ("Amazon Managed Streaming for Apache Kafka", "Amazon MSK"),
    ("Amazon Managed Streaming for Kafka Connect", "Amazon MSK"),
    ("Apache Kafka APIs for Amazon MSK clusters", "Amazon MSK"),
    ("Amazon Managed Workflows for Apache Airflow", "Amazon MWAA"),
    ("Amazon Interactive Video Service", "Amazon IVS"),
    ("Amazon Interactive Video Service Chat", "Amazon IVS"),
    ("AWS Key Management Service", "AWS KMS"),
    ("AWS Security Token Service", "AWS STS"),
    ("AWS Resource Access Manager (RAM)", "AWS RAM"),
    ("AWS Private Certificate Authority", "AWS Private CA"),
    ("AWS Private CA Connector for Active Directory", "AWS Private CA"),
    ("AWS Private CA Connector for SCEP", "AWS Private CA"),
    ("Application Discovery Arsenal", "AWS Application Discovery Service"),
    ("High-volume outbound communications", "Amazon Connect"),
    ("Tag Editor", "AWS Resource Groups"),
    ("Service Quotas", "AWS Service Quotas"),
    ("Amazon Elastic Inference", "Amazon Elastic Inference"),
    ("Amazon Elastic Transcoder", "Amazon Elastic Transcoder"),
    ("AWS Cost and Usage Report", "AWS Cost and Usage Report"),
    ("AWS Health APIs and Notifications", "AWS Health APIs and Notifications"),
    ("AWS Migration Hub Strategy Recommendations", "AWS Migration Hub"),
    ("AWS Migration Hub Refactor Spaces", "AWS Migration Hub"),
    ("AWS Partner central account management", "AWS Partner"),
    ("AWS service providing managed private networks", "AWS Private Network"),
    ("AWS Support App in Slack", "AWS Support"),
    ("AWS Microservice Extractor for .NET", "AWS Microservice Extractor"),
    ("AWS App Mesh Preview", "AWS App Mesh"),
    ("AWS CodeDeploy secure host commands service", "AWS CodeDeploy"),
    ("Amazon Managed Blockchain Query", "Amazon Managed Blockchain"),
    ("Amazon WorkSpaces Thin Client", "Amazon WorkSpaces"),
    ("Amazon WorkSpaces Secure Browser", "Amazon WorkSpaces"),
    ("Amazon WorkMail Message Flow", "Amazon WorkMail"),
    ("Amazon Managed Service for Prometheus", "Amazon Managed Service for Prometheus"),
    ("AWS Mainframe Modernization Service", "AWS Mainframe Modernization"),
    ("Amazon Verified Permissions", "Amazon Verified Permissions"),
    ("AWS Application Cost Profiler Service", "AWS Application Cost Profiler"),
    ("AWS Billing And Cost Management Data Exports", "AWS Billing"),
    ("AWS Marketplace Management Portal", "AWS Marketplace"),
    ("Amazon Data Lifecycle Manager", "Amazon Data Lifecycle Manager"),
    ("Amazon Message Delivery Service", "Amazon Message Delivery Service"),
    ("Amazon Message Gateway Service", "Amazon Message Gateway Service"),
    ("AWS Network Manager Chat", "AWS Network Manager"),
    ("Amazon Simple Workflow Service", "Amazon Simple Workflow Service"),
    ("Amazon Managed Grafana", "Amazon Managed Grafana"),
    ("Amazon Security Lake", "Amazon Security Lake"),
    ("AWS Performance Insights", "Amazon RDS"),
];

/// `AWS <prefix>...` families collapsed onto one name.
const AWS_FAMILIES: &[(&str, &str)] = &[
    ("IAM Identity Center", "AWS IAM Identity Center"),
    ("IoT", "AWS IoT"),
    ("FreeRTOS", "AWS IoT"),
    ("Elemental", "AWS Elemental"),
    ("Systems Manager", "AWS SSM"),
    ("Amplify", "AWS Amplify"),
    ("License Manager", "AWS License Manager"),
    ("Application Auto Scaling", "AWS Application Auto Scaling"),
    ("Migration Hub", "AWS Migration Hub"),
    ("Billing", "AWS Billing"),
];

/// `Amazon <prefix>...` families collapsed onto one name.
const AMAZON_FAMILIES: &[(&str, &str)] = &[
    ("CloudWatch", "Amazon CloudWatch"),
    ("Route 53", "Amazon Route 53"),
    ("S3", "Amazon S3"),
];

/// Canonical abbreviation for a raw service name. Never returns an empty string
/// for a non-empty input.
pub fn canonical_abbreviation(name: &str) -> String {
    let name = name.trim();

    if let Some((_, abbr)) = SPECIAL_CASES.iter().find(|(full, _)| *full == name) {
        return (*abbr).to_string();
    }

    if let Some(rest) = name.strip_prefix("AWS ") {
        if let Some((_, family)) = AWS_FAMILIES.iter().find(|(p, _)| rest.starts_with(p)) {
            return (*family).to_string();
        }
        let words: Vec<&str> = rest.split_whitespace().collect();
        if words.len() > 3 {
            return format!("AWS {}", words[..4].join(" "));
        }
        return name.to_string();
    }

    if let Some(rest) = name.strip_prefix("Amazon ") {
        if rest.starts_with("EC2") || rest.starts_with("Elastic") {
            // Container and Kubernetes services keep their own identity.
            if rest.contains("Container") || rest.contains("Kubernetes") {
                return name.to_string();
            }
            return "Amazon EC2".to_string();
        }
        if let Some((_, family)) = AMAZON_FAMILIES.iter().find(|(p, _)| rest.starts_with(p)) {
            return (*family).to_string();
        }
        let mut words = rest.split_whitespace();
        return match (words.next(), words.next()) {
            (Some(first), Some(_)) => format!("Amazon {first}"),
            _ => name.to_string(),
        };
    }

    name.to_string()
}
